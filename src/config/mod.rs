// src/config/mod.rs
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::info;

/// Env var naming a YAML file that overrides the defaults.
pub const CONFIG_ENV: &str = "DASHKPI_CONFIG";

/// Canonical module names and the free-text spellings that map onto them.
static DEFAULT_MODULE_ALIASES: &[(&str, &[&str])] = &[
    ("ConnectHub", &["connect", "connect hub", "connecthub", "conector"]),
    ("TaskHub", &["task", "task hub", "taskhub", "tarefas"]),
    ("XMLHub", &["xml", "xml hub", "xmlhub"]),
    ("FiscalHub", &["fiscal", "fiscal hub", "fiscalhub", "nfe", "nf-e"]),
    ("StockHub", &["stock", "stock hub", "stockhub", "estoque"]),
    ("PayHub", &["pay", "pay hub", "payhub", "financeiro", "pagamentos"]),
    ("SalesHub", &["sales", "sales hub", "saleshub", "vendas", "pdv"]),
    ("PeopleHub", &["people", "people hub", "peoplehub", "rh", "folha"]),
    ("BI", &["bi", "dashboard", "relatorios", "relatórios"]),
];

/// Position of the cell holding the sheet's self-reported record count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TotalHint {
    /// Logical line index, counted from the header line (header = 0).
    pub row: usize,
    /// Zero-based column index within that line.
    pub column: usize,
}

/// Ordered header spellings tried for each logical field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldAliases {
    pub status: Vec<String>,
    pub reason: Vec<String>,
    pub modules: Vec<String>,
    pub usage_age: Vec<String>,
    /// Column whose digits make a status-less row count as data.
    pub value: Vec<String>,
    pub requested: Vec<String>,
    pub canceled: Vec<String>,
    pub reverted: Vec<String>,
    pub cause: Vec<String>,
    pub treatment: Vec<String>,
    pub competitor: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            status: owned(&["Status", "STATUS", "Status do Cancelamento", "Situação"]),
            reason: owned(&["Motivo", "MOTIVO", "Motivo do Cancelamento", "Motivo Cancelamento"]),
            modules: owned(&["Módulo", "Modulo", "Módulos", "Modulos", "Módulos Afetados"]),
            usage_age: owned(&["Tempo de Uso", "Tempo de uso (meses)", "Meses de Uso", "Tempo de Casa"]),
            value: owned(&["Valor / Solicitado", "Valor Solicitado", "Valor"]),
            requested: owned(&["Valor / Solicitado"]),
            canceled: owned(&["Valor / Cancelado"]),
            reverted: owned(&["Valor / Revertido"]),
            cause: owned(&["Causa", "Causa Raiz", "Descrição", "Descricao"]),
            treatment: owned(&["Tratativa", "Tratamento", "Ação Tomada"]),
            competitor: owned(&["Concorrente", "Qual Concorrente", "Foi para Concorrente"]),
        }
    }
}

/// Character caps applied to qualitative excerpts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExcerptLimits {
    pub cause_chars: usize,
    pub treatment_chars: usize,
    pub max_excerpts: usize,
}

impl Default for ExcerptLimits {
    fn default() -> Self {
        Self {
            cause_chars: 500,
            treatment_chars: 300,
            max_excerpts: 500,
        }
    }
}

/// Everything about a sheet layout the pipeline needs to know.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub total_hint: Option<TotalHint>,
    /// Lowercase labels; a status cell counts when it equals or starts with one.
    pub statuses: Vec<String>,
    /// Status values that never count, whatever else the row holds.
    pub status_sentinels: Vec<String>,
    pub min_filled_fields: usize,
    /// Lowercase alias → canonical module name. Entries from a config file
    /// are merged over the built-in table; a matching alias is replaced.
    pub module_aliases: IndexMap<String, String>,
    /// Inclusive upper bounds (months) of the first three usage buckets,
    /// strictly ascending.
    pub usage_buckets: [f64; 3],
    pub fields: FieldAliases,
    pub competitors: Vec<String>,
    pub excerpt_limits: ExcerptLimits,
    /// Number of excerpts rendered into the analysis digest.
    pub digest_sample: usize,
}

impl Default for Config {
    fn default() -> Self {
        let mut module_aliases = IndexMap::new();
        for (canonical, aliases) in DEFAULT_MODULE_ALIASES {
            module_aliases.insert(canonical.to_lowercase(), canonical.to_string());
            for alias in aliases.iter() {
                module_aliases.insert(alias.to_string(), canonical.to_string());
            }
        }

        Self {
            total_hint: None,
            statuses: owned(&[
                "cancelado",
                "revertido",
                "desistência",
                "desistencia",
                "em negociação",
                "em negociacao",
                "em tratativa",
                "pendente",
                "finalizado",
            ]),
            status_sentinels: owned(&["true", "false", "-", "n/a"]),
            min_filled_fields: 3,
            module_aliases,
            usage_buckets: [3.0, 6.0, 12.0],
            fields: FieldAliases::default(),
            competitors: owned(&["Omie", "Bling", "Tiny", "Conta Azul", "TOTVS", "Sankhya"]),
            excerpt_limits: ExcerptLimits::default(),
            digest_sample: 20,
        }
    }
}

impl Config {
    /// Read a YAML file; sections it leaves out keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut cfg: Config = serde_yaml::from_str(text)?;
        cfg.normalize();
        cfg.validate().context("invalid config")?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let [a, b, c] = self.usage_buckets;
        let ascending = a.is_finite() && c.is_finite() && a >= 0.0 && a < b && b < c;
        if !ascending {
            return Err(anyhow!(
                "usage_buckets must be non-negative and strictly ascending, got {:?}",
                self.usage_buckets
            ));
        }
        Ok(())
    }

    /// Load from `$DASHKPI_CONFIG` when set, otherwise use the defaults.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                info!(path = %path, "loading config");
                Self::load(path.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    /// Bucket labels derived from the bounds, e.g. `0-3`, `3-6`, `6-12`, `+12`.
    pub fn usage_labels(&self) -> [String; 4] {
        let [a, b, c] = self.usage_buckets;
        [
            format!("0-{}", fmt_bound(a)),
            format!("{}-{}", fmt_bound(a), fmt_bound(b)),
            format!("{}-{}", fmt_bound(b), fmt_bound(c)),
            format!("+{}", fmt_bound(c)),
        ]
    }

    // Lookups compare lowercase text, so user-supplied tables are folded here.
    fn normalize(&mut self) {
        self.statuses = self.statuses.iter().map(|s| s.trim().to_lowercase()).collect();
        self.status_sentinels = self
            .status_sentinels
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        let mut merged = Config::default().module_aliases;
        for (alias, canonical) in std::mem::take(&mut self.module_aliases) {
            merged.insert(alias.trim().to_lowercase(), canonical);
        }
        self.module_aliases = merged;
        let canonical: Vec<String> = self.module_aliases.values().cloned().collect();
        for name in canonical {
            self.module_aliases.entry(name.to_lowercase()).or_insert(name);
        }
    }
}

fn fmt_bound(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
