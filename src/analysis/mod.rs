// src/analysis/mod.rs
pub mod digest;

pub use digest::digest;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use tracing::{info, warn};
use url::Url;

/// Env vars read by [`AnalysisClient::from_env`].
pub const ENDPOINT_ENV: &str = "DASHKPI_ANALYSIS_URL";
pub const TOKEN_ENV: &str = "DASHKPI_ANALYSIS_TOKEN";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("code fence regex is valid")
});

/// Structured payload returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Insights {
    /// Shown whenever the service reply cannot be read.
    pub fn placeholder() -> Self {
        Self {
            summary: "Análise indisponível no momento.".to_string(),
            insights: vec!["Não foi possível interpretar a resposta da análise.".to_string()],
            recommendations: vec!["Tente gerar a análise novamente mais tarde.".to_string()],
        }
    }
}

/// Read an insights payload, either bare JSON or JSON inside a Markdown
/// code fence. Anything unreadable becomes [`Insights::placeholder`].
pub fn parse_insights(raw: &str) -> Insights {
    let body = CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    match serde_json::from_str::<Insights>(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("unreadable analysis payload: {}", e);
            Insights::placeholder()
        }
    }
}

/// HTTP client for the text-analysis service.
pub struct AnalysisClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl AnalysisClient {
    pub fn new(client: Client, endpoint: Url, token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }

    /// Build from `$DASHKPI_ANALYSIS_URL` (and optional token); None when unset.
    pub fn from_env(client: Client) -> Result<Option<Self>> {
        let endpoint = match env::var(ENDPOINT_ENV) {
            Ok(v) if !v.trim().is_empty() => v,
            _ => return Ok(None),
        };
        let endpoint = Url::parse(endpoint.trim())
            .with_context(|| format!("parsing {} as a URL", ENDPOINT_ENV))?;
        let token = env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty());
        Ok(Some(Self::new(client, endpoint, token)))
    }

    /// POST the digest and read the reply as insights.
    /// Transport and status errors are returned; a garbled body is not.
    pub async fn request(&self, digest: &str) -> Result<Insights> {
        let mut req = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "prompt": digest }));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let body = req
            .send()
            .await
            .context("sending analysis request")?
            .error_for_status()
            .context("analysis service returned an error status")?
            .text()
            .await
            .context("reading analysis response")?;

        info!(bytes = body.len(), "analysis response received");
        Ok(parse_insights(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let got = parse_insights(
            r#"{"summary":"Churn concentrado em preço","insights":["a"],"recommendations":["b","c"]}"#,
        );
        assert_eq!(got.summary, "Churn concentrado em preço");
        assert_eq!(got.insights, vec!["a"]);
        assert_eq!(got.recommendations, vec!["b", "c"]);
    }

    #[test]
    fn parses_fenced_json_with_missing_fields() {
        let raw = "Segue a análise:\n```json\n{\"summary\": \"ok\"}\n```\nObrigado";
        let got = parse_insights(raw);
        assert_eq!(got.summary, "ok");
        assert!(got.insights.is_empty());
    }

    #[test]
    fn garbage_falls_back_to_placeholder() {
        assert_eq!(parse_insights("not json at all"), Insights::placeholder());
        assert_eq!(parse_insights(""), Insights::placeholder());
        assert_eq!(parse_insights("```\n[1, 2]\n```"), Insights::placeholder());
    }
}
