use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::utils::capitalize_first;

/// Separators between module mentions: `,` `;` `/`, or a standalone `e` / `+`.
static MODULE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[,;/]\s*|\s+e\s+|\s+\+\s+").expect("module separator regex is valid")
});

/// Map free text onto a canonical module name.
/// Unknown names pass through with their first character uppercased.
pub fn canonical_module(raw: &str, aliases: &IndexMap<String, String>) -> String {
    let trimmed = raw.trim();
    match aliases.get(&trimmed.to_lowercase()) {
        Some(canonical) => canonical.clone(),
        None => capitalize_first(trimmed),
    }
}

/// Split a module cell into canonical names, in the order they appear.
pub fn split_modules(cell: &str, aliases: &IndexMap<String, String>) -> Vec<String> {
    // checked before splitting, `/` would otherwise cut "N/A" in two
    if is_placeholder(cell) {
        return Vec::new();
    }
    MODULE_SEPARATOR
        .split(cell)
        .map(str::trim)
        .filter(|m| !m.is_empty() && !is_placeholder(m))
        .map(|m| canonical_module(m, aliases))
        .collect()
}

fn is_placeholder(s: &str) -> bool {
    let s = s.trim();
    s == "-" || s.eq_ignore_ascii_case("n/a")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn splits_on_every_separator() {
        let cfg = Config::default();
        assert_eq!(
            split_modules("ConnectHub, TaskHub e XMLHub", &cfg.module_aliases),
            vec!["ConnectHub", "TaskHub", "XMLHub"]
        );
        assert_eq!(
            split_modules("connect hub; estoque / fiscal + BI E vendas", &cfg.module_aliases),
            vec!["ConnectHub", "StockHub", "FiscalHub", "BI", "SalesHub"]
        );
    }

    #[test]
    fn word_boundaries_protect_module_names() {
        let cfg = Config::default();
        // the `e` inside a word and a `+` without spaces do not split
        assert_eq!(
            split_modules("estoque+pdv", &cfg.module_aliases),
            vec!["Estoque+pdv"]
        );
    }

    #[test]
    fn sentinels_and_empties_are_filtered() {
        let cfg = Config::default();
        assert_eq!(
            split_modules("N/A", &cfg.module_aliases),
            Vec::<String>::new()
        );
        assert_eq!(
            split_modules(" - ,, xml", &cfg.module_aliases),
            vec!["XMLHub"]
        );
        assert!(split_modules("", &cfg.module_aliases).is_empty());
    }

    #[test]
    fn unknown_modules_pass_through() {
        let cfg = Config::default();
        assert_eq!(canonical_module("  portal do cliente ", &cfg.module_aliases), "Portal do cliente");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let cfg = Config::default();
        for alias in cfg.module_aliases.keys() {
            let once = canonical_module(alias, &cfg.module_aliases);
            assert_eq!(canonical_module(&once, &cfg.module_aliases), once, "alias {}", alias);
        }
        let unknown = canonical_module("erp antigo", &cfg.module_aliases);
        assert_eq!(canonical_module(&unknown, &cfg.module_aliases), unknown);
    }
}
