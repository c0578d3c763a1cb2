// src/snapshot/mod.rs
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::info;

use crate::aggregate::Summary;
use crate::analysis::Insights;
use crate::process::{IngestWarning, Ingestion};

/// What a live viewer reads: the Summary plus where and when it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    /// File path or export URL the CSV text came from.
    pub source: String,
    pub expected_total: Option<usize>,
    pub warnings: Vec<IngestWarning>,
    pub summary: Summary,
    pub insights: Option<Insights>,
}

impl Snapshot {
    pub fn from_ingestion(source: impl Into<String>, ingestion: Ingestion) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.into(),
            expected_total: ingestion.expected_total,
            warnings: ingestion.warnings,
            summary: ingestion.summary,
            insights: None,
        }
    }
}

/// Path of the snapshot named `name` inside `dir`.
pub fn snapshot_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(anyhow!("invalid snapshot name {:?}", name));
    }
    Ok(dir.join(format!("{}.json", name)))
}

/// Write `<dir>/<name>.json` atomically: temp file in `dir`, then rename.
/// A failure leaves any previous snapshot untouched.
pub fn write_snapshot<P: AsRef<Path>>(dir: P, name: &str, snapshot: &Snapshot) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let path = snapshot_path(dir, name)?;
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, snapshot).context("serializing snapshot")?;
    tmp.write_all(b"\n")?;
    tmp.persist(&path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;

    info!(path = %path.display(), records = snapshot.summary.total, "wrote snapshot");
    Ok(path)
}

pub fn read_snapshot<P: AsRef<Path>>(dir: P, name: &str) -> Result<Snapshot> {
    let path = snapshot_path(dir.as_ref(), name)?;
    let file = fs::File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))
}
