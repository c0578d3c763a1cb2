// src/aggregate/mod.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::process::{
    modules::split_modules,
    raw_table::RawRecord,
    resolve::{resolve, resolve_exact_any},
    utils::{capitalize_first, parse_leading_number, parse_money, truncate_chars},
};

/// Label → occurrence count, iterated in insertion order.
pub type Histogram = IndexMap<String, usize>;

/// Answers in the competitor column that mean "none".
const NO_COMPETITOR: &[&str] = &["n/a", "-", "não", "nao", "no", "none", "nenhum"];

/// Free-text cause/treatment of one record, already truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    pub status: String,
    pub reason: String,
    pub cause: String,
    pub treatment: String,
}

/// Everything the dashboards render for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub status: Histogram,
    pub reasons: Histogram,
    /// Sorted by count, descending; ties keep first-seen order.
    pub modules: Histogram,
    /// Always holds the four usage buckets, in ascending order.
    pub usage_age: Histogram,
    pub requested_total: f64,
    pub canceled_total: f64,
    pub reverted_total: f64,
    pub competitors: Histogram,
    pub excerpts: Vec<Excerpt>,
}

impl Summary {
    /// Share of `count` in the batch, as a percentage.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}

/// Single pass over `records`. A malformed cell contributes nothing for its
/// own field and never stops the rest of the record or batch.
#[tracing::instrument(level = "debug", skip_all, fields(records = records.len()))]
pub fn aggregate(records: &[RawRecord], cfg: &Config) -> Summary {
    let fields = &cfg.fields;
    let labels = cfg.usage_labels();

    let mut status = Histogram::new();
    let mut reasons = Histogram::new();
    let mut modules = Histogram::new();
    let mut usage_age: Histogram = labels.iter().map(|l| (l.clone(), 0)).collect();
    let mut competitors = Histogram::new();
    let mut excerpts = Vec::new();
    let (mut requested_total, mut canceled_total, mut reverted_total) = (0.0, 0.0, 0.0);

    for record in records {
        let st = resolve(record, &fields.status).trim();
        if !st.is_empty() {
            *status.entry(st.to_string()).or_insert(0) += 1;
        }

        let reason = resolve(record, &fields.reason).trim();
        if !reason.is_empty() {
            *reasons.entry(reason.to_string()).or_insert(0) += 1;
        }

        for module in split_modules(resolve(record, &fields.modules), &cfg.module_aliases) {
            *modules.entry(module).or_insert(0) += 1;
        }

        if let Some(months) = parse_leading_number(resolve(record, &fields.usage_age)) {
            let bucket = usage_bucket(months, &cfg.usage_buckets);
            *usage_age.entry(labels[bucket].clone()).or_insert(0) += 1;
        }

        requested_total += money(resolve_exact_any(record, &fields.requested));
        canceled_total += money(resolve_exact_any(record, &fields.canceled));
        reverted_total += money(resolve_exact_any(record, &fields.reverted));

        for name in competitor_mentions(resolve(record, &fields.competitor), &cfg.competitors) {
            *competitors.entry(name).or_insert(0) += 1;
        }

        let cause = resolve(record, &fields.cause).trim();
        let treatment = resolve(record, &fields.treatment).trim();
        if (!cause.is_empty() || !treatment.is_empty())
            && excerpts.len() < cfg.excerpt_limits.max_excerpts
        {
            excerpts.push(Excerpt {
                status: st.to_string(),
                reason: reason.to_string(),
                cause: truncate_chars(cause, cfg.excerpt_limits.cause_chars),
                treatment: truncate_chars(treatment, cfg.excerpt_limits.treatment_chars),
            });
        }
    }

    let mut ranked: Vec<(String, usize)> = modules.into_iter().collect();
    // sort_by is stable, so equal counts keep first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let modules: Histogram = ranked.into_iter().collect();

    debug!(
        statuses = status.len(),
        reasons = reasons.len(),
        modules = modules.len(),
        excerpts = excerpts.len(),
        "aggregated batch"
    );

    Summary {
        total: records.len(),
        status,
        reasons,
        modules,
        usage_age,
        requested_total,
        canceled_total,
        reverted_total,
        competitors,
        excerpts,
    }
}

/// Index of the bucket for `months`; bounds are inclusive upper limits.
pub fn usage_bucket(months: f64, bounds: &[f64; 3]) -> usize {
    bounds.iter().position(|b| months <= *b).unwrap_or(3)
}

fn money(cell: &str) -> f64 {
    parse_money(cell).max(0.0)
}

/// Known competitors named in `cell`, or the cell itself if it names none.
fn competitor_mentions(cell: &str, known: &[String]) -> Vec<String> {
    let cell = cell.trim();
    let lower = cell.to_lowercase();
    if cell.is_empty() || NO_COMPETITOR.contains(&lower.as_str()) {
        return Vec::new();
    }
    let hits: Vec<String> = known
        .iter()
        .filter(|name| lower.contains(&name.to_lowercase()))
        .cloned()
        .collect();
    if hits.is_empty() {
        vec![capitalize_first(cell)]
    } else {
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs.iter().copied().collect()
    }

    fn sample() -> Vec<RawRecord> {
        vec![
            record(&[
                ("Status", "Cancelado"),
                ("Motivo", "Preço"),
                ("Módulo", "ConnectHub, TaskHub"),
                ("Tempo de Uso", "2"),
                ("Valor / Solicitado", "R$ 1.000,00"),
                ("Valor / Cancelado", "R$ 1.000,00"),
                ("Valor / Revertido", ""),
                ("Concorrente", "Foi para o Omie"),
                ("Causa", "Achou caro"),
                ("Tratativa", ""),
            ]),
            record(&[
                ("Status", "Revertido"),
                ("Motivo", "Suporte"),
                ("Módulo", "task hub e xml"),
                ("Tempo de Uso", "6"),
                ("Valor / Solicitado", "R$ 500,00"),
                ("Valor / Cancelado", ""),
                ("Valor / Revertido", "R$ 500,00"),
                ("Concorrente", "não"),
                ("Causa", ""),
                ("Tratativa", ""),
            ]),
            record(&[
                ("Status", "Cancelado"),
                ("Motivo", "Preço"),
                ("Módulo", "N/A"),
                ("Tempo de Uso", "12,5 meses"),
                ("Valor / Solicitado", "abc"),
                ("Valor / Cancelado", "-R$ 50,00"),
                ("Valor / Revertido", ""),
                ("Concorrente", "Planilha própria"),
                ("Causa", ""),
                ("Tratativa", "Oferecido desconto"),
            ]),
        ]
    }

    #[test]
    fn end_to_end_counts() {
        let summary = aggregate(&sample(), &Config::default());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.status.get("Cancelado"), Some(&2));
        assert_eq!(summary.status.get("Revertido"), Some(&1));
        assert_eq!(summary.reasons.get("Preço"), Some(&2));
        assert_eq!(summary.requested_total, 1500.0);
        assert_eq!(summary.canceled_total, 1000.0);
        assert_eq!(summary.reverted_total, 500.0);
        assert!(summary.status.values().sum::<usize>() <= summary.total);
    }

    #[test]
    fn modules_sorted_descending_with_stable_ties() {
        let summary = aggregate(&sample(), &Config::default());
        let order: Vec<(&str, usize)> = summary
            .modules
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        assert_eq!(order, vec![("TaskHub", 2), ("ConnectHub", 1), ("XMLHub", 1)]);
    }

    #[test]
    fn usage_buckets_use_inclusive_bounds() {
        let summary = aggregate(&sample(), &Config::default());
        let buckets: Vec<(&str, usize)> = summary
            .usage_age
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        assert_eq!(buckets, vec![("0-3", 1), ("3-6", 1), ("6-12", 0), ("+12", 1)]);

        let bounds = [3.0, 6.0, 12.0];
        assert_eq!(usage_bucket(3.0, &bounds), 0);
        assert_eq!(usage_bucket(3.1, &bounds), 1);
        assert_eq!(usage_bucket(12.0, &bounds), 2);
        assert_eq!(usage_bucket(12.01, &bounds), 3);
    }

    #[test]
    fn competitors_and_excerpts() {
        let summary = aggregate(&sample(), &Config::default());
        assert_eq!(summary.competitors.get("Omie"), Some(&1));
        assert_eq!(summary.competitors.get("Planilha própria"), Some(&1));
        assert_eq!(summary.competitors.len(), 2);

        assert_eq!(summary.excerpts.len(), 2);
        assert_eq!(summary.excerpts[0].cause, "Achou caro");
        assert_eq!(summary.excerpts[1].treatment, "Oferecido desconto");
        assert_eq!(summary.excerpts[1].status, "Cancelado");
    }

    #[test]
    fn excerpts_are_truncated() {
        let long = "x".repeat(800);
        let records = vec![record(&[
            ("Status", "Cancelado"),
            ("Causa", long.as_str()),
            ("Tratativa", long.as_str()),
        ])];
        let summary = aggregate(&records, &Config::default());
        assert_eq!(summary.excerpts[0].cause.chars().count(), 500);
        assert_eq!(summary.excerpts[0].treatment.chars().count(), 300);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let records = sample();
        let cfg = Config::default();
        let a = aggregate(&records, &cfg);
        let b = aggregate(&records, &cfg);
        assert_eq!(a, b);
        assert_eq!(a.requested_total.to_bits(), b.requested_total.to_bits());
    }

    #[test]
    fn empty_batch() {
        let summary = aggregate(&[], &Config::default());
        assert_eq!(summary.total, 0);
        assert!(summary.status.is_empty());
        assert_eq!(summary.usage_age.len(), 4);
        assert_eq!(summary.percent(0), 0.0);
    }
}
