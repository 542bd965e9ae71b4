use crate::generator::profile::DeviceProfile;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use sweepcore::prelude::{CutoffMetric, SessionConfig};

/// Order of sweep steps: every LO power, then every LO frequency, then the
/// input level ramp.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    pub lo_powers_dbm: Vec<f64>,
    pub lo_frequencies_hz: Vec<f64>,
    pub input_start_db: f64,
    pub input_stop_db: f64,
    pub input_step_db: f64,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            lo_powers_dbm: vec![0.0],
            lo_frequencies_hz: vec![1.0e9, 2.0e9, 3.0e9],
            input_start_db: -30.0,
            input_stop_db: 0.0,
            input_step_db: 1.0,
        }
    }
}

impl SweepPlan {
    pub fn input_levels(&self) -> Vec<f64> {
        if self.input_step_db <= 0.0 || self.input_stop_db < self.input_start_db {
            return vec![self.input_start_db];
        }
        // tolerate float error just below a whole step count
        let span = (self.input_stop_db - self.input_start_db) / self.input_step_db;
        let steps = (span + 1e-9).floor() as usize;
        (0..=steps)
            .map(|idx| self.input_start_db + idx as f64 * self.input_step_db)
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.lo_powers_dbm.len() * self.lo_frequencies_hz.len() * self.input_levels().len()
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.lo_powers_dbm.is_empty(), "sweep plan has no LO powers");
        ensure!(!self.lo_frequencies_hz.is_empty(), "sweep plan has no LO frequencies");
        ensure!(self.input_step_db > 0.0, "input step must be positive");
        ensure!(
            self.input_stop_db >= self.input_start_db,
            "input stop level is below the start level"
        );
        Ok(())
    }
}

pub const DEFAULT_CALIBRATION_PATH: &str = "calibration/adjust.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub device_label: String,
    pub sweep: SweepPlan,
    pub device: DeviceProfile,
    pub session: SessionConfig,
    pub output_dir: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            device_label: "mod".into(),
            sweep: SweepPlan::default(),
            device: DeviceProfile::default(),
            session: SessionConfig {
                calibration_path: Some(PathBuf::from(DEFAULT_CALIBRATION_PATH)),
                cutoff_metric: CutoffMetric::CorrectedGain,
                ..SessionConfig::default()
            },
            output_dir: PathBuf::from("results"),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .sweep
            .validate()
            .with_context(|| format!("validating sweep plan in {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(seed: u64) -> Self {
        let mut config = Self::default();
        config.device.seed = seed;
        config
    }

    /// Session settings with the expected point count filled in from the plan.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            expected_points: Some(self.sweep.point_count()),
            ..self.session.clone()
        }
    }
}
