use crate::process::{raw_table::RawRecord, utils::collapse_whitespace};

/// Look up the first non-empty value among `candidates`.
///
/// For each candidate, in order: the exact key, the key with one trailing
/// space, then any key equal to it ignoring case and surrounding whitespace.
/// Returns `""` when nothing matches.
pub fn resolve<'a, S: AsRef<str>>(record: &'a RawRecord, candidates: &[S]) -> &'a str {
    for candidate in candidates {
        let name = candidate.as_ref();

        if let Some(v) = record.get(name).filter(|v| !v.is_empty()) {
            return v;
        }
        if let Some(v) = record
            .get(&format!("{} ", name))
            .filter(|v| !v.is_empty())
        {
            return v;
        }

        let wanted = name.trim().to_lowercase();
        let loose = record
            .iter()
            .find(|(k, v)| !v.is_empty() && k.trim().to_lowercase() == wanted);
        if let Some((_, v)) = loose {
            return v;
        }
    }
    ""
}

/// Strict lookup for monetary columns.
///
/// Keys and `name` are both trimmed and whitespace-collapsed before an
/// equality check, so a padded or trailing-space header still matches while
/// a neighbouring column such as `Valor / Solicitado Total` never does.
/// Case matters.
pub fn resolve_exact<'a>(record: &'a RawRecord, name: &str) -> &'a str {
    let target = collapse_whitespace(name);
    record
        .iter()
        .find(|(k, _)| collapse_whitespace(k) == target)
        .map(|(_, v)| v)
        .unwrap_or("")
}

/// `resolve_exact` over several spellings; first non-empty hit wins.
pub fn resolve_exact_any<'a, S: AsRef<str>>(record: &'a RawRecord, names: &[S]) -> &'a str {
    names
        .iter()
        .map(|n| resolve_exact(record, n.as_ref()))
        .find(|v| !v.is_empty())
        .unwrap_or("")
}
