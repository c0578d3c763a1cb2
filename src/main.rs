use anyhow::{anyhow, Context, Result};
use dashkpi::{
    analysis::{self, AnalysisClient},
    config::Config,
    fetch,
    process,
    snapshot::{self, Snapshot},
};
use reqwest::Client;
use std::{env, path::PathBuf};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: dashkpi (<file.csv> | --sheet <id> [--gid <gid>]) \
                     [--out <dir>] [--name <snapshot>]";

enum Source {
    File(PathBuf),
    Sheet { id: String, gid: String },
}

struct Args {
    source: Source,
    out_dir: PathBuf,
    name: String,
}

fn parse_args() -> Result<Args> {
    let mut file = None;
    let mut sheet = None;
    let mut gid = "0".to_string();
    let mut out_dir = PathBuf::from("snapshots");
    let mut name = "cancelamentos".to_string();

    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = || it.next().ok_or_else(|| anyhow!("{} needs a value\n{}", arg, USAGE));
        match arg.as_str() {
            "--sheet" => sheet = Some(value()?),
            "--gid" => gid = value()?,
            "--out" => out_dir = PathBuf::from(value()?),
            "--name" => name = value()?,
            s if s.starts_with("--") => return Err(anyhow!("unknown flag {}\n{}", s, USAGE)),
            _ => file = Some(PathBuf::from(&arg)),
        }
    }

    let source = match (file, sheet) {
        (Some(path), None) => Source::File(path),
        (None, Some(id)) => Source::Sheet { id, gid },
        _ => return Err(anyhow!(USAGE)),
    };
    Ok(Args {
        source,
        out_dir,
        name,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) args + config ────────────────────────────────────────────
    let args = parse_args()?;
    let cfg = Config::from_env()?;
    let client = Client::new();

    // ─── 3) acquire CSV text ─────────────────────────────────────────
    let start = Instant::now();
    let (origin, text) = match &args.source {
        Source::File(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            (path.display().to_string(), text)
        }
        Source::Sheet { id, gid } => {
            let url = fetch::export_url(id, gid)?;
            info!(url = %url, "fetching sheet export");
            let text = fetch::fetch_csv(&client, &url).await?;
            (url.to_string(), text)
        }
    };
    info!(origin = %origin, bytes = text.len(), elapsed = ?start.elapsed(), "csv loaded");

    // ─── 4) ingest ───────────────────────────────────────────────────
    let ingestion = match process::ingest(&text, &cfg) {
        Ok(ingestion) => ingestion,
        Err(e) => {
            warn!("nothing to publish: {}", e);
            return Ok(());
        }
    };
    let mut snap = Snapshot::from_ingestion(origin, ingestion);

    // ─── 5) optional analysis ────────────────────────────────────────
    match AnalysisClient::from_env(client.clone()) {
        Ok(Some(analyst)) => {
            let prompt = analysis::digest(&snap.summary, cfg.digest_sample);
            match analyst.request(&prompt).await {
                Ok(insights) => snap.insights = Some(insights),
                Err(e) => error!("analysis failed, publishing without it: {:#}", e),
            }
        }
        Ok(None) => info!("no analysis endpoint configured"),
        Err(e) => error!("analysis client misconfigured: {:#}", e),
    }

    // ─── 6) publish snapshot ─────────────────────────────────────────
    let path = snapshot::write_snapshot(&args.out_dir, &args.name, &snap)?;
    info!(path = %path.display(), elapsed = ?start.elapsed(), "all done");
    Ok(())
}
