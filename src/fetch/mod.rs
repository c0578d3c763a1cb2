// src/fetch/mod.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d/";

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// CSV export URL for one tab (`gid`) of a shared spreadsheet.
pub fn export_url(sheet_id: &str, gid: &str) -> Result<Url> {
    let sheet_id = sheet_id.trim();
    if sheet_id.is_empty() || sheet_id.contains('/') {
        return Err(anyhow!("invalid spreadsheet id {:?}", sheet_id));
    }
    let mut url = Url::parse(SHEETS_BASE)?
        .join(&format!("{}/export", sheet_id))
        .with_context(|| format!("building export url for {}", sheet_id))?;
    url.query_pairs_mut()
        .append_pair("format", "csv")
        .append_pair("gid", gid.trim());
    Ok(url)
}

/// Download the CSV text behind `url`, retrying transport errors.
/// A non-success status is returned as an error without retrying.
pub async fn fetch_csv(client: &Client, url: &Url) -> Result<String> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        match client.get(url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => {
                    debug!(url = %url, bytes = text.len(), attempt, "fetched csv");
                    return Ok(text);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(url = %url, attempt, "reading body failed: {}", e);
                    sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e).context("reading csv body"),
            },
            Ok(resp) => return Err(anyhow!("HTTP error fetching {}: {}", url, resp.status())),
            Err(e) if attempt < MAX_RETRIES => {
                warn!(url = %url, attempt, "request failed: {}", e);
                sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(e).with_context(|| format!("fetching {}", url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_export_url() -> Result<()> {
        let url = export_url("1AbC-xyz_09", "123")?;
        assert_eq!(
            url.as_str(),
            "https://docs.google.com/spreadsheets/d/1AbC-xyz_09/export?format=csv&gid=123"
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_ids() {
        assert!(export_url("", "0").is_err());
        assert!(export_url("a/b", "0").is_err());
    }
}
