use crate::report::model::ResultSet;
use anyhow::Context;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Paths written by [`export_results`].
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub points: PathBuf,
    pub cutoffs: PathBuf,
    pub log: PathBuf,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(value)
        .with_context(|| format!("encoding {}", path.display()))?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

/// Writes the point table and the cutoff table as separate JSON documents
/// under `dir/<run_id>/`, and appends a one-line summary to `dir/runs.log`.
pub fn export_results(
    dir: &Path,
    run_id: &str,
    results: &ResultSet,
) -> anyhow::Result<ExportPaths> {
    let run_dir = dir.join(run_id);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory {}", run_dir.display()))?;

    let points = run_dir.join(format!("{}-points.json", results.device_label));
    let cutoffs = run_dir.join(format!("{}-cutoffs.json", results.device_label));
    write_json(&points, &results.points)?;
    write_json(&cutoffs, &results.cutoffs)?;

    let log = dir.join("runs.log");
    let line = format!(
        "run={} device={} points={} frequencies={} compressed={}\n",
        run_id,
        results.device_label,
        results.points.len(),
        results.cutoffs.len(),
        results.cutoffs.iter().filter(|c| c.compressed).count()
    );
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log)
        .with_context(|| format!("opening {}", log.display()))?;
    file.write_all(line.as_bytes())?;

    Ok(ExportPaths {
        points,
        cutoffs,
        log,
    })
}
