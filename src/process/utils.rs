/// Trim whitespace and drop every literal quote character.
pub fn clean_str(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

/// Collapse runs of whitespace to a single space and trim both ends.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-effort money parse for spreadsheet cells like `"R$ 1.234,56"`.
///
/// - strips a leading currency marker (`R$`, `$`, `US$`, ...)
/// - drops `.` thousands separators and turns `,` into the decimal point
/// - anything left that does not parse yields `0.0`
pub fn parse_money(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let negative = trimmed.starts_with('-');
    let body = trimmed
        .trim_start_matches('-')
        .trim_start_matches(|c: char| c.is_alphabetic() || c == '$' || c.is_whitespace());

    let cleaned: String = body
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => {
            if negative {
                -v
            } else {
                v
            }
        }
        _ => 0.0,
    }
}

/// Parse the leading number of a cell such as `"8,5 meses"` → `8.5`.
/// Comma is accepted as the decimal separator. Returns None when the cell
/// does not start with a number.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(',', ".");
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '-' | '+' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(raw: &str, max: usize) -> String {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => raw[..idx].to_string(),
        None => raw.to_string(),
    }
}

/// Uppercase the first character, leave the rest untouched.
pub fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
