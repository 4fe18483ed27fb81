//! JSON output of a harvest run.
//!
//! One file per run:
//!
//! ```text
//! {
//!   "generated_at": "2025-05-06T10:12:00Z",
//!   "records": [ { "source": "politifact", "claim": "...", "canonical_rating": "FALSE", ... } ],
//!   "summary": { "sites": [ ... ], "total_records": 1200, ... }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::NormalizedRecord;
use crate::pipeline::Harvest;
use crate::pipeline::summary::RunSummary;
use crate::utils::ensure_writable_dir;

#[derive(Debug, Serialize)]
struct HarvestFile<'a> {
    generated_at: DateTime<Utc>,
    records: &'a [NormalizedRecord],
    summary: &'a RunSummary,
}

/// Serialize a run to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_harvest(harvest: &Harvest, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = HarvestFile {
        generated_at: Utc::now(),
        records: &harvest.records,
        summary: &harvest.summary,
    };
    let json = serde_json::to_string_pretty(&file)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Err(e) = ensure_writable_dir(dir).await {
        error!(dir = %dir.display(), error = %e, "Output directory is not writable");
        return Err(e);
    }

    fs::write(path, json).await?;
    info!(records = harvest.records.len(), "Wrote JSON output");
    Ok(())
}
