//! Award consensus batch entrypoint.
//! Loads `.env`, config and messages, runs the pipeline once, writes reports + metrics.
//!
//! Usage: `award-consensus [messages.json]` (or `AWARD_INPUT_PATH`); reports go to
//! `AWARD_OUTPUT_DIR` (default `out`).

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use award_consensus::ingest::load_messages_from;
use award_consensus::metrics::Metrics;
use award_consensus::{write_reports, LayeredRecognizer, Pipeline, PipelineConfig};

const DEFAULT_INPUT_PATH: &str = "data/messages.json";
const DEFAULT_OUTPUT_DIR: &str = "out";

/// Compact logs by default; JSON lines when AWARD_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("AWARD_LOG_JSON").ok().as_deref() == Some("1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = %e, "metrics recorder unavailable");
            None
        }
    };

    let input = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("AWARD_INPUT_PATH").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH));
    let out_dir = std::env::var("AWARD_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR));

    // Everything fallible happens before any stage runs.
    let cfg = PipelineConfig::from_toml().context("loading pipeline config")?;
    let pipeline = Pipeline::from_config(&cfg, Arc::new(LayeredRecognizer::standard()))?;
    let messages = load_messages_from(&input)?;

    let output = pipeline.run(&messages);
    write_reports(&out_dir, &output)?;
    if let Some(m) = &metrics {
        m.write_to(&out_dir.join("metrics.prom"))?;
    }

    for e in &output.elections {
        info!(
            category = %e.category,
            winner = %e.winner,
            share = format!("{:.3}", e.winner_share),
            low_confidence = e.low_confidence_flag,
            "result"
        );
    }
    Ok(())
}
