use crate::interface::CutoffRecord;
use crate::math::units::hz_to_display_ghz;
use crate::prelude::{SweepError, SweepResult};
use crate::processing::series::{FrequencySeries, SeriesPair};
use crate::telemetry::log::LogManager;

/// Result of scanning one series for its compression point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutoffSearch {
    /// Index of the first pair whose drop from the reference exceeds the threshold.
    FoundAt(usize),
    /// The sweep never compressed; the last pair stands in.
    Exhausted,
}

/// Finds, per LO frequency, the input level where the metric falls more than
/// `threshold_db` below the first (small-signal) sample.
pub struct CompressionPointDetector {
    threshold_db: f64,
    logger: LogManager,
}

impl CompressionPointDetector {
    /// `cutoff_level_db` is the configured (negative) level; its magnitude is the threshold.
    pub fn new(cutoff_level_db: f64) -> Self {
        Self {
            threshold_db: cutoff_level_db.abs(),
            logger: LogManager::new("cutoff"),
        }
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn search(&self, pairs: &[SeriesPair]) -> SweepResult<CutoffSearch> {
        let reference = pairs
            .first()
            .ok_or_else(|| SweepError::InvariantViolation("empty frequency series".into()))?
            .metric;

        Ok(pairs
            .iter()
            .position(|pair| reference - pair.metric > self.threshold_db)
            .map_or(CutoffSearch::Exhausted, CutoffSearch::FoundAt))
    }

    pub fn detect_series(&self, series: &FrequencySeries) -> SweepResult<CutoffRecord> {
        let pairs = series.pairs();
        let lo_f = hz_to_display_ghz(series.key().hz());
        let search = self.search(pairs).map_err(|_| {
            SweepError::InvariantViolation(format!("empty frequency series at {} GHz", lo_f))
        })?;

        let (pair, compressed) = match search {
            CutoffSearch::FoundAt(idx) => (pairs[idx], true),
            CutoffSearch::Exhausted => (pairs[pairs.len() - 1], false),
        };

        if !compressed {
            self.logger.detail(&format!(
                "{} GHz did not compress, reporting sweep bound {:.2} dB",
                lo_f, pair.input_db
            ));
        }

        Ok(CutoffRecord {
            lo_f,
            cutoff_input_level: pair.input_db,
            compressed,
        })
    }

    pub fn detect(&self, buckets: &[FrequencySeries]) -> SweepResult<Vec<CutoffRecord>> {
        buckets
            .iter()
            .map(|series| self.detect_series(series))
            .collect()
    }
}
