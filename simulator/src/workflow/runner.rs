use crate::generator::profile::build_readings;
use crate::report::model::ResultSet;
use crate::report::summary::point_report;
use crate::workflow::config::WorkflowConfig;
use anyhow::{ensure, Context};
use log::{debug, info};
use sweepcore::telemetry::SweepMetrics;
use sweepcore::{RawReading, ResultSession};

pub struct WorkflowResult {
    pub results: ResultSet,
    pub metrics: SweepMetrics,
    pub template_saved: bool,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Synthesizes the configured sweep and reduces it.
    pub fn execute(&self, save_template: bool) -> anyhow::Result<WorkflowResult> {
        let readings = build_readings(&self.config.sweep, &self.config.device)
            .context("synthesizing sweep readings")?;
        self.execute_readings(readings, save_template)
    }

    /// Runs one session over `readings`: ingest, finalize and optionally
    /// persist a calibration template.
    pub fn execute_readings(
        &self,
        readings: Vec<RawReading>,
        save_template: bool,
    ) -> anyhow::Result<WorkflowResult> {
        ensure!(
            !save_template || self.config.session.calibration_path.is_some(),
            "saving a calibration template needs a calibration path"
        );

        let mut session = ResultSession::new(self.config.to_session_config())
            .context("opening result session")?;
        session.set_sweep_params([
            ("device".to_string(), self.config.device_label.clone()),
            ("points".to_string(), readings.len().to_string()),
            (
                "cutoff_level_db".to_string(),
                self.config.session.cutoff_level_db.to_string(),
            ),
        ]);

        for (idx, raw) in readings.into_iter().enumerate() {
            let point = session
                .ingest(raw)
                .with_context(|| format!("reducing sweep step {}", idx))?;
            debug!("point {}\n{}", idx, point_report(point));
        }
        if let Some(latest) = session.latest() {
            info!("last point\n{}", point_report(latest));
        }

        session.finalize().context("finalizing sweep")?;

        let template_saved = if save_template {
            session
                .save_calibration_template()
                .context("saving calibration template")?
        } else {
            false
        };

        Ok(WorkflowResult {
            results: ResultSet {
                device_label: self.config.device_label.clone(),
                sweep_params: session.sweep_params().clone(),
                points: session.points().to_vec(),
                cutoffs: session.cutoffs().to_vec(),
            },
            metrics: *session.metrics(),
            template_saved,
        })
    }
}
