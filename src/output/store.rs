use crate::actuals::ComparisonReport;
use crate::error::OutputError;
use crate::model::{PlanningRun, RunStatus, StopReason};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::report::build_run_markdown;

/// Paths written for one planning run
#[derive(Debug, Clone)]
pub struct WrittenRun {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// Write `plan_<run_id>.json` and its markdown trace
pub fn write_run(output_dir: &Path, run: &PlanningRun) -> Result<WrittenRun, OutputError> {
    fs::create_dir_all(output_dir).map_err(OutputError::CreateDir)?;

    let json_path = output_dir.join(format!("plan_{}.json", run.run_id));
    let json = serde_json::to_string_pretty(run)?;
    write_file(&json_path, json)?;

    let md_path = output_dir.join(format!("plan_{}.md", run.run_id));
    write_file(&md_path, build_run_markdown(run))?;

    info!("Wrote run {} to {:?}", run.run_id, json_path);
    Ok(WrittenRun {
        json: json_path,
        markdown: md_path,
    })
}

pub fn load_run(path: &Path) -> Result<PlanningRun, OutputError> {
    let content = fs::read_to_string(path).map_err(|e| OutputError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// One line of `shiftplan list`
#[derive(Debug, Clone)]
pub struct RunListing {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub scenario: String,
    pub status: RunStatus,
    pub stop_reason: Option<StopReason>,
    pub best_score: Option<f64>,
}

/// Saved runs in `output_dir`, newest first. Files that fail to parse are
/// skipped with a warning; a missing directory lists nothing.
pub fn list_runs(output_dir: &Path, limit: usize) -> Result<Vec<RunListing>, OutputError> {
    if !output_dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(output_dir).map_err(|e| OutputError::Read {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut listings = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if !(name.starts_with("plan_") && name.ends_with(".json")) {
            continue;
        }
        match load_run(&path) {
            Ok(run) => listings.push(RunListing {
                scenario: format!(
                    "{} {} ({})",
                    run.scenario.day_of_week, run.scenario.shift, run.scenario.date
                ),
                best_score: run.best.as_ref().map(|b| b.evaluation.overall()),
                run_id: run.run_id,
                started_at: run.started_at,
                status: run.status,
                stop_reason: run.stop_reason,
            }),
            Err(e) => warn!("Skipping {:?}: {}", path, e),
        }
    }

    listings.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    listings.truncate(limit);
    Ok(listings)
}

/// Write `eval_<run_id>.json` next to the run it compares against
pub fn write_comparison(
    output_dir: &Path,
    report: &ComparisonReport,
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(output_dir).map_err(OutputError::CreateDir)?;

    let path = output_dir.join(format!("eval_{}.json", report.run_id));
    let json = serde_json::to_string_pretty(report)?;
    write_file(&path, json)?;
    Ok(path)
}

fn write_file(path: &Path, content: String) -> Result<(), OutputError> {
    fs::write(path, content).map_err(|e| OutputError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
