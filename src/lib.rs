// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod canonical;
pub mod config;
pub mod consensus;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod relevance;
pub mod spikes;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{Candidate, EntityRecognizer, LayeredRecognizer};
pub use crate::config::PipelineConfig;
pub use crate::consensus::ElectionResult;
pub use crate::ingest::Message;
pub use crate::pipeline::{Pipeline, PipelineOutput};

use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write one pretty-printed JSON report into `dir`.
fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> anyhow::Result<()> {
    let path = dir.join(name);
    let body = serde_json::to_string_pretty(value)?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))
}

/// Persist a run: windows, candidates, cluster report, elections, and the full output.
pub fn write_reports(dir: &Path, out: &PipelineOutput) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_json(dir, "windows.json", &out.windows)?;
    write_json(dir, "candidates.json", &out.candidates)?;
    write_json(
        dir,
        "clusters.json",
        &serde_json::json!({
            "categories": out.category_clusters,
            "entities": out.entity_clusters,
            "headline_categories": out.headline_categories,
            "hosts": out.host_clusters,
        }),
    )?;
    write_json(dir, "elections.json", &out.elections)?;
    write_json(dir, "nominees.json", &out.nominees)?;
    write_json(dir, "output.json", out)?;
    info!(target: "pipeline", dir = %dir.display(), "reports written");
    Ok(())
}
