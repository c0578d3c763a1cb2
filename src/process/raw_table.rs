use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::Config;
use crate::process::{
    resolve::resolve,
    split::split_fields,
    utils::collapse_whitespace,
};

/// One data row keyed by the original header text, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRecord {
    fields: IndexMap<String, String>,
}

impl RawRecord {
    /// Pair headers with cells by position; missing cells become empty strings.
    /// A repeated header keeps its first position and the later value.
    pub fn from_cells(headers: &[String], cells: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), cells.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Headers plus every row that passed the validity rules.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names from the first logical line, whitespace-collapsed.
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    /// Record count the sheet reports about itself, if the hint cell held one.
    pub expected_total: Option<usize>,
    /// Non-blank data lines inside the hint bound that were checked.
    pub candidates: usize,
}

/// Header line → `RawTable`.
///
/// - line 0 is the header
/// - the configured hint cell, if it holds a positive integer, caps how many
///   following lines are read as data (later ones are sheet totals)
/// - rows that are blank, too sparse, or fail both the status and value
///   checks are dropped without trace beyond `trace!`
pub fn parse_records(lines: &[String], cfg: &Config) -> RawTable {
    let Some(header_line) = lines.first() else {
        return RawTable::default();
    };
    // Excel's "CSV UTF-8" export prefixes a byte-order mark
    let header_line = header_line.trim_start_matches('\u{feff}');
    let headers: Vec<String> = split_fields(header_line)
        .iter()
        .map(|h| collapse_whitespace(h))
        .collect();

    let expected_total = read_total_hint(lines, cfg);
    let data = &lines[1..];
    let limit = expected_total.unwrap_or(data.len()).min(data.len());

    let mut records = Vec::with_capacity(limit);
    let mut candidates = 0;
    for (idx, line) in data[..limit].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        candidates += 1;
        let cells = split_fields(line);
        let filled = cells.iter().filter(|c| !c.is_empty()).count();
        if filled < cfg.min_filled_fields {
            trace!(line = idx + 1, filled, "dropping sparse row");
            continue;
        }
        let record = RawRecord::from_cells(&headers, &cells);
        if !is_valid_record(&record, cfg) {
            trace!(line = idx + 1, "dropping row without status or value");
            continue;
        }
        records.push(record);
    }

    debug!(
        headers = headers.len(),
        candidates,
        kept = records.len(),
        "parsed records"
    );

    RawTable {
        headers,
        records,
        expected_total,
        candidates,
    }
}

/// A row counts when its status is a known label, or failing that when its
/// value column carries a non-zero digit.
pub fn is_valid_record(record: &RawRecord, cfg: &Config) -> bool {
    let status = resolve(record, &cfg.fields.status).trim().to_lowercase();
    if !status.is_empty() && !cfg.status_sentinels.contains(&status) {
        let known = cfg
            .statuses
            .iter()
            .any(|label| status == *label || status.starts_with(label.as_str()));
        if known {
            return true;
        }
    }

    resolve(record, &cfg.fields.value)
        .chars()
        .any(|c| matches!(c, '1'..='9'))
}

fn read_total_hint(lines: &[String], cfg: &Config) -> Option<usize> {
    let hint = cfg.total_hint?;
    let line = lines.get(hint.row)?;
    let cell = split_fields(line).into_iter().nth(hint.column)?;
    let cleaned: String = cell.chars().filter(|c| !matches!(c, '.' | ' ')).collect();
    match cleaned.parse::<usize>() {
        Ok(n) if n > 0 => {
            debug!(row = hint.row, column = hint.column, expected = n, "found total hint");
            Some(n)
        }
        _ => None,
    }
}
