use tracing::trace;

use crate::process::utils::clean_str;

/// Split one logical line into fields.
///
/// A `"` toggles the in-quotes flag and a `,` only separates fields outside
/// quotes. Quotes are structural: they never survive into the output, and an
/// escaped `""` inside a field is not supported.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                fields.push(clean_str(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(clean_str(&current));
    fields
}

/// Rejoin physical lines that belong to one quoted field spanning newlines.
///
/// A line with an odd number of quotes opens a pending logical line; following
/// physical lines are appended with a single space until the quote count is
/// even again. An unterminated pending line at end of input is still emitted.
pub fn join_logical_lines(text: &str) -> Vec<String> {
    let mut logical = Vec::new();
    let mut pending: Option<(String, usize)> = None;

    for raw in text.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let quotes = line.matches('"').count();

        match pending.take() {
            Some((mut acc, count)) => {
                acc.push(' ');
                acc.push_str(line);
                let total = count + quotes;
                if total % 2 == 0 {
                    logical.push(acc);
                } else {
                    pending = Some((acc, total));
                }
            }
            None if quotes % 2 == 1 => pending = Some((line.to_string(), quotes)),
            None => logical.push(line.to_string()),
        }
    }

    if let Some((acc, _)) = pending {
        trace!("flushing unterminated quoted line at end of input");
        logical.push(acc);
    }
    logical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_commas_stay_in_field() {
        assert_eq!(split_fields(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn fields_are_trimmed_and_unquoted() {
        assert_eq!(
            split_fields(r#" Cancelado , Usabilidade ,"R$ 1.000,00" "#),
            vec!["Cancelado", "Usabilidade", "R$ 1.000,00"]
        );
    }

    #[test]
    fn empty_trailing_fields_are_kept() {
        assert_eq!(split_fields("a,,"), vec!["a", "", ""]);
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn odd_quote_degrades_without_panicking() {
        assert_eq!(split_fields(r#"a,"b,c"#), vec!["a", "b,c"]);
    }

    #[test]
    fn multi_line_field_is_rejoined() {
        let text = "h1,h2,h3\r\nx,\"first\nsecond\",z\ny,w,v\n";
        let lines = join_logical_lines(text);
        assert_eq!(
            lines,
            vec!["h1,h2,h3", "x,\"first second\",z", "y,w,v", ""]
        );
        assert_eq!(split_fields(&lines[1]), vec!["x", "first second", "z"]);
    }

    #[test]
    fn field_spanning_three_lines() {
        let lines = join_logical_lines("a,\"one\ntwo\nthree\",b");
        assert_eq!(lines, vec!["a,\"one two three\",b"]);
    }

    #[test]
    fn unterminated_quote_is_flushed() {
        let lines = join_logical_lines("a,b\nc,\"open\nstill open");
        assert_eq!(lines, vec!["a,b", "c,\"open still open"]);
    }
}
