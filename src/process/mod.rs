// src/process/mod.rs
pub mod modules;
pub mod raw_table;
pub mod resolve;
pub mod split;
pub mod utils;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::{aggregate, Summary};
use crate::config::Config;
use raw_table::parse_records;
use split::join_logical_lines;

/// Batch-level conditions that leave nothing to show.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("no CSV text to ingest")]
    EmptyInput,
    #[error("no valid records among {candidates} data lines")]
    NoRecords { candidates: usize },
}

/// Non-blocking signals returned next to a Summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// The sheet's own total disagrees with the number of parsed records.
    CountMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestWarning::CountMismatch { expected, actual } => write!(
                f,
                "sheet reports {} records but {} were parsed",
                expected, actual
            ),
        }
    }
}

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingestion {
    pub headers: Vec<String>,
    pub summary: Summary,
    pub expected_total: Option<usize>,
    pub warnings: Vec<IngestWarning>,
}

/// Raw CSV text → Summary.
///
/// Runs the whole pipeline over one in-memory batch: rejoin multi-line
/// records, parse and filter rows, then aggregate. Per-cell and per-row
/// problems are absorbed; only an empty input or an empty result is an error.
#[tracing::instrument(level = "info", skip_all, fields(bytes = text.len()))]
pub fn ingest(text: &str, cfg: &Config) -> Result<Ingestion, IngestError> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(IngestError::EmptyInput);
    }

    let lines = join_logical_lines(text);
    let table = parse_records(&lines, cfg);
    if table.records.is_empty() {
        let candidates = table.candidates;
        warn!(candidates, "no valid records");
        return Err(IngestError::NoRecords { candidates });
    }

    let mut warnings = Vec::new();
    if let Some(expected) = table.expected_total {
        if expected != table.records.len() {
            let w = IngestWarning::CountMismatch {
                expected,
                actual: table.records.len(),
            };
            warn!("{}", w);
            warnings.push(w);
        }
    }

    let summary = aggregate(&table.records, cfg);
    info!(
        records = summary.total,
        requested = summary.requested_total,
        canceled = summary.canceled_total,
        reverted = summary.reverted_total,
        "ingested batch"
    );

    Ok(Ingestion {
        headers: table.headers,
        summary,
        expected_total: table.expected_total,
        warnings,
    })
}
