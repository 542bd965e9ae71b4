use crate::interface::{CutoffRecord, DerivedPoint, RawReading};
use crate::prelude::{SessionConfig, SweepError, SweepResult};
use crate::processing::calibration::{
    CalibrationOverlay, CalibrationStore, Correction, JsonCalibrationStore,
    MemoryCalibrationStore,
};
use crate::processing::cutoff::CompressionPointDetector;
use crate::processing::reducer::PointReducer;
use crate::processing::series::SeriesAccumulator;
use crate::telemetry::{LogManager, SweepMetrics};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle of a [`ResultSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Accumulating,
    Finalized,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::Accumulating => "accumulating",
            SessionState::Finalized => "finalized",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Owns every piece of state for one sweep: raw readings, derived points,
/// per-frequency series, the cutoff table and the calibration overlay.
///
/// All mutation goes through `&mut self`; a session is single-writer and is
/// not meant to be shared across threads during a sweep.
pub struct ResultSession {
    config: SessionConfig,
    store: Box<dyn CalibrationStore>,
    calibration: CalibrationOverlay,
    reducer: PointReducer,
    detector: CompressionPointDetector,
    state: SessionState,
    raw: Vec<RawReading>,
    points: Vec<DerivedPoint>,
    series: SeriesAccumulator,
    cutoffs: Vec<CutoffRecord>,
    sweep_params: BTreeMap<String, String>,
    metrics: SweepMetrics,
    logger: LogManager,
}

impl ResultSession {
    /// Opens a session backed by the JSON calibration file named in `config`,
    /// or by a throwaway in-memory table when no path is configured.
    pub fn new(config: SessionConfig) -> SweepResult<Self> {
        let store: Box<dyn CalibrationStore> = match &config.calibration_path {
            Some(path) => Box::new(JsonCalibrationStore::new(path)),
            None => Box::new(MemoryCalibrationStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(
        config: SessionConfig,
        store: Box<dyn CalibrationStore>,
    ) -> SweepResult<Self> {
        let logger = LogManager::new("session");
        let calibration =
            CalibrationOverlay::load(store.as_ref(), config.expected_points, &logger)?;
        let detector = CompressionPointDetector::new(config.cutoff_level_db);

        Ok(Self {
            config,
            store,
            calibration,
            reducer: PointReducer::new(),
            detector,
            state: SessionState::Empty,
            raw: Vec::new(),
            points: Vec::new(),
            series: SeriesAccumulator::new(),
            cutoffs: Vec::new(),
            sweep_params: BTreeMap::new(),
            metrics: SweepMetrics::new(),
            logger,
        })
    }

    fn reject(&self, action: &'static str) -> SweepError {
        SweepError::InvalidStateTransition {
            state: self.state.label(),
            action,
        }
    }

    /// Reduces one reading and records it. Nothing is stored when the
    /// reading is malformed.
    pub fn ingest(&mut self, raw: RawReading) -> SweepResult<&DerivedPoint> {
        if self.state == SessionState::Finalized {
            return Err(self.reject("ingest"));
        }

        let reduction = match self.reducer.reduce(&raw, &self.calibration, self.points.len()) {
            Ok(reduction) => reduction,
            Err(err) => {
                self.metrics.record_rejected();
                return Err(err);
            }
        };

        if reduction.correction == Correction::OutOfRange {
            self.metrics.record_uncorrected();
        }

        self.series.record(
            reduction.key,
            reduction.input_db,
            reduction.metric(self.config.cutoff_metric),
        );
        self.raw.push(raw);
        self.points.push(reduction.point);
        self.metrics.record_reduced();
        self.state = SessionState::Accumulating;

        let index = self.points.len() - 1;
        Ok(&self.points[index])
    }

    /// Closes the series and computes one cutoff per LO frequency.
    pub fn finalize(&mut self) -> SweepResult<&[CutoffRecord]> {
        if self.state != SessionState::Accumulating {
            return Err(self.reject("finalize"));
        }

        let pairs = self.series.total_pairs();
        if pairs != self.points.len() || self.raw.len() != self.points.len() {
            return Err(SweepError::InvariantViolation(format!(
                "{} readings, {} points and {} series pairs disagree",
                self.raw.len(),
                self.points.len(),
                pairs
            )));
        }

        self.cutoffs = self.detector.detect(self.series.buckets())?;
        self.state = SessionState::Finalized;

        let compressed = self.cutoffs.iter().filter(|c| c.compressed).count();
        self.logger.record(&format!(
            "finalized {} points over {} frequencies, {} compressed, {} uncorrected",
            self.points.len(),
            self.cutoffs.len(),
            compressed,
            self.metrics.uncorrected()
        ));

        Ok(self.cutoffs.as_slice())
    }

    /// Discards the run and reloads calibration from the configured store.
    ///
    /// The reload happens first; when it fails the session is left exactly as
    /// it was.
    pub fn clear(&mut self) -> SweepResult<()> {
        let calibration = CalibrationOverlay::load(
            self.store.as_ref(),
            self.config.expected_points,
            &self.logger,
        )?;

        self.calibration = calibration;
        self.raw.clear();
        self.points.clear();
        self.series.clear();
        self.cutoffs.clear();
        self.sweep_params.clear();
        self.metrics.reset();
        self.state = SessionState::Empty;
        Ok(())
    }

    /// Persists a zero-correction template for this run's points unless a
    /// calibration table is already loaded. Returns whether one was written.
    pub fn save_calibration_template(&mut self) -> SweepResult<bool> {
        if self.points.is_empty() {
            return Err(self.reject("save a calibration template"));
        }
        let written = self
            .calibration
            .save_template(&self.points, self.store.as_ref())?;
        if written {
            self.logger.record(&format!(
                "saved calibration template with {} entries",
                self.points.len()
            ));
        }
        Ok(written)
    }

    /// Free-form parameters describing the run, cleared with the session.
    pub fn set_sweep_params<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.sweep_params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    pub fn sweep_params(&self) -> &BTreeMap<String, String> {
        &self.sweep_params
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Finalized
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn raw_readings(&self) -> &[RawReading] {
        &self.raw
    }

    pub fn points(&self) -> &[DerivedPoint] {
        &self.points
    }

    /// Most recently reduced point, for live reporting.
    pub fn latest(&self) -> Option<&DerivedPoint> {
        self.points.last()
    }

    pub fn series(&self) -> &SeriesAccumulator {
        &self.series
    }

    /// Empty until the session is finalized.
    pub fn cutoffs(&self) -> &[CutoffRecord] {
        &self.cutoffs
    }

    pub fn calibration(&self) -> &CalibrationOverlay {
        &self.calibration
    }

    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::CalibrationEntry;
    use crate::prelude::CutoffMetric;

    fn reading(lo_f: f64, mod_u_db: f64, sa_p_out: f64) -> RawReading {
        RawReading {
            lo_p: Some(0.0),
            lo_f: Some(lo_f),
            loss: Some(0.0),
            mod_u: Some(10.0),
            mod_u_db: Some(mod_u_db),
            src_u: Some(5.0),
            src_i: Some(100.0),
            sa_p_out: Some(sa_p_out),
            sa_p_carr: Some(-40.0),
            sa_p_sb: Some(-30.0),
            sa_p_3_harm: Some(-50.0),
        }
    }

    fn entry(kp: f64) -> CalibrationEntry {
        CalibrationEntry {
            lo_p: 0.0,
            lo_f: 1.0,
            kp,
        }
    }

    fn session_with(store: &MemoryCalibrationStore, metric: CutoffMetric) -> ResultSession {
        let config = SessionConfig {
            cutoff_metric: metric,
            ..Default::default()
        };
        ResultSession::with_store(config, Box::new(store.clone())).unwrap()
    }

    #[test]
    fn counts_match_after_finalize() {
        let mut session = ResultSession::new(SessionConfig::default()).unwrap();
        assert_eq!(session.state(), SessionState::Empty);
        let steps = [
            (1.0e9, -20.0),
            (2.0e9, -20.0),
            (1.0e9, -15.0),
            (2.0e9, -15.0),
            (1.0e9, -10.0),
        ];
        for (f, input) in steps {
            session.ingest(reading(f, input, input + 10.0)).unwrap();
        }
        assert_eq!(session.state(), SessionState::Accumulating);
        assert!(!session.is_ready());

        let cutoffs = session.finalize().unwrap();
        assert_eq!(cutoffs.len(), 2);
        assert!(session.is_ready());
        assert_eq!(session.points().len(), 5);
        assert_eq!(session.raw_readings().len(), 5);
        assert_eq!(session.series().total_pairs(), 5);
        assert_eq!(session.metrics().reduced(), 5);
    }

    #[test]
    fn short_calibration_table_skips_trailing_points() {
        let store = MemoryCalibrationStore::with_entries(vec![entry(1.0), entry(-0.5)]);
        let mut session = session_with(&store, CutoffMetric::OutputPower);
        for _ in 0..3 {
            session.ingest(reading(1.0e9, -5.0, -10.0)).unwrap();
        }
        let kps: Vec<f64> = session.points().iter().map(|p| p.kp).collect();
        assert_eq!(kps, vec![-4.0, -5.5, -5.0]);
        assert_eq!(session.metrics().uncorrected(), 1);
    }

    #[test]
    fn cutoff_metric_selects_stored_quantity() {
        // output rises 0.5 dB per step while the input rises 2 dB, so gain
        // compresses even though output power never drops
        let steps = [(-20.0, 0.0), (-18.0, 0.5), (-16.0, 1.0), (-14.0, 1.5)];

        let mut by_output = session_with(&MemoryCalibrationStore::new(), CutoffMetric::OutputPower);
        let mut by_gain = session_with(&MemoryCalibrationStore::new(), CutoffMetric::CorrectedGain);
        for (input, output) in steps {
            by_output.ingest(reading(1.0e9, input, output)).unwrap();
            by_gain.ingest(reading(1.0e9, input, output)).unwrap();
        }

        let output_cutoff = by_output.finalize().unwrap()[0].clone();
        assert!(!output_cutoff.compressed);
        assert_eq!(output_cutoff.cutoff_input_level, -14.0);

        // gain: 20.0, 18.5, 17.0, 15.5 -> first drop beyond 1 dB at -18
        let gain_cutoff = by_gain.finalize().unwrap()[0].clone();
        assert!(gain_cutoff.compressed);
        assert_eq!(gain_cutoff.cutoff_input_level, -18.0);
    }

    #[test]
    fn calibration_shifts_gain_metric() {
        let store = MemoryCalibrationStore::with_entries(vec![entry(0.0), entry(-2.0)]);
        let mut session = session_with(&store, CutoffMetric::CorrectedGain);
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        let cutoffs = session.finalize().unwrap();
        assert!(cutoffs[0].compressed);
    }

    #[test]
    fn refinalize_and_ingest_after_finalize_are_rejected() {
        let mut session = ResultSession::new(SessionConfig::default()).unwrap();
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        session.finalize().unwrap();

        assert!(matches!(
            session.finalize(),
            Err(SweepError::InvalidStateTransition {
                state: "finalized",
                action: "finalize"
            })
        ));
        assert!(matches!(
            session.ingest(reading(1.0e9, -5.0, 0.0)),
            Err(SweepError::InvalidStateTransition { action: "ingest", .. })
        ));
        assert_eq!(session.points().len(), 1);
    }

    #[test]
    fn clear_resets_and_empty_finalize_is_rejected() {
        let mut session = ResultSession::new(SessionConfig::default()).unwrap();
        session.set_sweep_params([("device", "mixer-7")]);
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        session.finalize().unwrap();

        session.clear().unwrap();
        assert!(!session.is_ready());
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.points().is_empty());
        assert!(session.raw_readings().is_empty());
        assert!(session.series().is_empty());
        assert!(session.cutoffs().is_empty());
        assert!(session.sweep_params().is_empty());
        assert!(session.latest().is_none());

        assert!(matches!(
            session.finalize(),
            Err(SweepError::InvalidStateTransition { state: "empty", .. })
        ));
    }

    #[test]
    fn malformed_reading_records_nothing() {
        let mut session = ResultSession::new(SessionConfig::default()).unwrap();
        let raw = RawReading {
            sa_p_out: None,
            ..reading(1.0e9, -10.0, 0.0)
        };
        assert!(matches!(
            session.ingest(raw),
            Err(SweepError::MalformedInput { field: "sa_p_out" })
        ));
        assert!(session.points().is_empty());
        assert!(session.series().is_empty());
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.metrics().rejected(), 1);
    }

    #[test]
    fn template_save_requires_points_and_is_idempotent() {
        let store = MemoryCalibrationStore::new();
        let mut session = session_with(&store, CutoffMetric::OutputPower);
        assert!(matches!(
            session.save_calibration_template(),
            Err(SweepError::InvalidStateTransition { .. })
        ));

        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        session.ingest(reading(2.0e9, -10.0, 0.0)).unwrap();
        assert!(session.save_calibration_template().unwrap());
        let first = store.snapshot().unwrap();
        assert_eq!(first.len(), 2);

        assert!(!session.save_calibration_template().unwrap());
        assert_eq!(store.snapshot().unwrap(), first);
        assert_eq!(session.calibration().entries().unwrap(), first.as_slice());
    }

    #[test]
    fn clear_picks_up_edited_calibration() {
        let store = MemoryCalibrationStore::new();
        let mut session = session_with(&store, CutoffMetric::OutputPower);
        assert!(!session.calibration().is_loaded());

        store.replace(Some(vec![entry(0.25)]));
        session.clear().unwrap();
        assert_eq!(session.calibration().correction_at(0), Some(0.25));

        let point = session.ingest(reading(1.0e9, -5.0, -10.0)).unwrap();
        assert_eq!(point.kp, -4.75);
    }

    #[test]
    fn failed_reload_keeps_run_and_edited_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adjust.json");
        let config = SessionConfig {
            calibration_path: Some(path.clone()),
            ..Default::default()
        };
        let mut session = ResultSession::new(config).unwrap();
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        assert!(session.save_calibration_template().unwrap());

        let edited = r#"[{"lo_p":0.0,"lo_f":1.0,"kp":0.75},]"#;
        std::fs::write(&path, edited).unwrap();

        assert!(matches!(session.clear(), Err(SweepError::Serde(_))));
        assert_eq!(session.state(), SessionState::Accumulating);
        assert_eq!(session.points().len(), 1);
        assert!(session.calibration().is_loaded());

        assert!(!session.save_calibration_template().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), edited);
    }

    #[test]
    fn template_save_leaves_unparseable_artifact_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adjust.json");
        let config = SessionConfig {
            calibration_path: Some(path.clone()),
            ..Default::default()
        };
        let mut session = ResultSession::new(config).unwrap();
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();

        let edited = "[{\"lo_p\": 0.0,";
        std::fs::write(&path, edited).unwrap();

        assert!(matches!(
            session.save_calibration_template(),
            Err(SweepError::Serde(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), edited);
    }

    #[test]
    fn latest_tracks_most_recent_point() {
        let mut session = ResultSession::new(SessionConfig::default()).unwrap();
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        session.ingest(reading(1.0e9, -8.0, 1.0)).unwrap();
        assert_eq!(session.latest().unwrap().p_in_db, -8.0);
    }

    #[test]
    fn json_backed_session_persists_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            calibration_path: Some(dir.path().join("adjust.json")),
            ..Default::default()
        };
        let mut session = ResultSession::new(config).unwrap();
        session.ingest(reading(1.0e9, -10.0, 0.0)).unwrap();
        assert!(session.save_calibration_template().unwrap());

        session.clear().unwrap();
        assert_eq!(session.calibration().entries().map(|e| e.len()), Some(1));
    }
}
