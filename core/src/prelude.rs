use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default compression level; its magnitude is the detection threshold.
pub const DEFAULT_CUTOFF_LEVEL_DB: f64 = -1.0;

/// Which quantity the compression detector compares against its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffMetric {
    /// Loss-compensated analyzer output power.
    #[default]
    OutputPower,
    /// Calibration-corrected gain (`kp`).
    CorrectedGain,
}

/// Configuration handed to a [`crate::ResultSession`] at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Location of the persisted calibration table. `None` runs uncalibrated.
    pub calibration_path: Option<PathBuf>,
    pub cutoff_metric: CutoffMetric,
    pub cutoff_level_db: f64,
    /// Points the configured sweep plan will produce, used to sanity-check
    /// the calibration table length.
    pub expected_points: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibration_path: None,
            cutoff_metric: CutoffMetric::default(),
            cutoff_level_db: DEFAULT_CUTOFF_LEVEL_DB,
            expected_points: None,
        }
    }
}

impl SessionConfig {
    /// Positive drop, in dB, that marks compression.
    pub fn threshold_db(&self) -> f64 {
        self.cutoff_level_db.abs()
    }
}

/// Common error type for the reduction engine.
#[derive(thiserror::Error, Debug)]
pub enum SweepError {
    #[error("malformed input: missing or non-finite field `{field}`")]
    MalformedInput { field: &'static str },
    #[error("invalid state transition: cannot {action} while {state}")]
    InvalidStateTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("calibration failure: {0}")]
    Calibration(String),
    #[error("calibration i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("calibration encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type SweepResult<T> = Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_one_db_threshold() {
        let config = SessionConfig::default();
        assert_eq!(config.threshold_db(), 1.0);
        assert_eq!(config.cutoff_metric, CutoffMetric::OutputPower);
    }

    #[test]
    fn cutoff_metric_parses_snake_case() {
        let metric: CutoffMetric = serde_json::from_str("\"corrected_gain\"").unwrap();
        assert_eq!(metric, CutoffMetric::CorrectedGain);
    }
}
