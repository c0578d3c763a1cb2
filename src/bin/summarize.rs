// src/bin/summarize.rs

use anyhow::{Context, Result};
use dashkpi::{analysis, config::Config, process, snapshot::Snapshot};
use glob::glob;
use std::{env, fs, path::PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Summarize every CSV matching a glob, one independent batch per file,
/// and print the snapshots as a JSON array. `--digest` prints the analysis
/// digest text instead.
fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut pattern = "data/*.csv".to_string();
    let mut as_digest = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--digest" => as_digest = true,
            _ => pattern = arg,
        }
    }

    let cfg = Config::from_env()?;

    // 1) Collect matching files
    let paths: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .collect();
    if paths.is_empty() {
        return Err(anyhow::anyhow!("No CSV files found under '{}'", pattern));
    }
    info!("{} files to summarize", paths.len());

    // 2) One ingestion per file, sequentially
    let mut snapshots = Vec::with_capacity(paths.len());
    for path in &paths {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                error!("reading {}: {}", path.display(), e);
                continue;
            }
        };
        match process::ingest(&text, &cfg) {
            Ok(ingestion) => {
                snapshots.push(Snapshot::from_ingestion(path.display().to_string(), ingestion))
            }
            Err(e) => warn!("{}: {}", path.display(), e),
        }
    }

    // 3) Emit
    if as_digest {
        for snap in &snapshots {
            println!("# {}\n", snap.source);
            println!("{}", analysis::digest(&snap.summary, cfg.digest_sample));
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    }
    Ok(())
}
