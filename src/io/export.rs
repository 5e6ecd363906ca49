//! Export a setup plan to JSON.
//!
//! The plan holds every resolved id and the exact line item configs that were
//! (or, for a dry run, would have been) sent to the ad server.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::pipeline::SetupReport;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct PlanFile<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub setup: &'a SetupReport,
}

pub fn write_plan_json(path: &Path, report: &SetupReport, dry_run: bool) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create plan JSON '{}': {e}", path.display())))?;

    let plan = PlanFile {
        tool: env!("CARGO_PKG_NAME"),
        generated_at: Utc::now(),
        dry_run,
        setup: report,
    };

    serde_json::to_writer_pretty(file, &plan).map_err(|e| AppError::io(format!("Failed to write plan JSON: {e}")))?;

    Ok(())
}
