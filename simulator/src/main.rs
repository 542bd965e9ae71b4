use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use report::export::export_results;
use report::summary::cutoff_table;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use sweepcore::prelude::CutoffMetric;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    OutputPower,
    CorrectedGain,
}

impl From<MetricArg> for CutoffMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::OutputPower => CutoffMetric::OutputPower,
            MetricArg::CorrectedGain => CutoffMetric::CorrectedGain,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Offline RF sweep reduction and P1dB report")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Calibration table (JSON); overrides the workflow setting
    #[arg(long)]
    calibration: Option<PathBuf>,
    /// Quantity compared against its small-signal reference
    #[arg(long, value_enum)]
    cutoff_metric: Option<MetricArg>,
    /// Compression level in dB; its magnitude is the detection threshold
    #[arg(long, allow_negative_numbers = true)]
    cutoff_level: Option<f64>,
    /// Seed for the simulated device; overrides the workflow setting
    #[arg(long)]
    seed: Option<u64>,
    /// Directory receiving the exported tables
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write a zero-correction calibration template when none is loaded
    #[arg(long, default_value_t = false)]
    save_template: bool,
    /// Skip writing result files
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn run_id() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("run-{}", secs)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(0)
    };
    if let Some(seed) = args.seed {
        config.device.seed = seed;
    }
    if let Some(path) = args.calibration {
        config.session.calibration_path = Some(path);
    }
    if let Some(metric) = args.cutoff_metric {
        config.session.cutoff_metric = metric.into();
    }
    if let Some(level) = args.cutoff_level {
        config.session.cutoff_level_db = level;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }

    info!(
        "sweeping {} ({} points, metric {:?})",
        config.device_label,
        config.sweep.point_count(),
        config.session.cutoff_metric
    );

    let runner = Runner::new(config.clone());
    let result = runner.execute(args.save_template)?;

    println!(
        "Reduced {} points over {} frequencies ({} uncorrected)",
        result.results.points.len(),
        result.results.cutoffs.len(),
        result.metrics.uncorrected()
    );
    println!("{}", cutoff_table(&result.results.cutoffs));

    if args.save_template && !result.template_saved {
        warn!("calibration table already present, template not written");
    }

    if !args.dry_run {
        let paths = export_results(&config.output_dir, &run_id(), &result.results)
            .context("exporting sweep results")?;
        println!(
            "Wrote {} and {}, logged to {}",
            paths.points.display(),
            paths.cutoffs.display(),
            paths.log.display()
        );
    }

    Ok(())
}
