// src/config/pipeline.rs
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};
use tracing::info;

use crate::analyze::{AnchorCfg, EntityPick};
use crate::canonical::discover::DEFAULT_HEADLINE_MIN_SUPPORT;
use crate::canonical::known::DEFAULT_KNOWN_CUTOFF;
use crate::canonical::{
    StrategyKind, DEFAULT_CATEGORY_MIN_SUPPORT, DEFAULT_CATEGORY_THRESHOLD,
    DEFAULT_ENTITY_MIN_SUPPORT, DEFAULT_ENTITY_THRESHOLD,
};
use crate::consensus::{VoterParams, DEFAULT_LOW_CONFIDENCE_SHARE};
use crate::relevance::GateCfg;
use crate::spikes::{DEFAULT_BIN_WIDTH_MS, DEFAULT_EXPAND_RADIUS, DEFAULT_TOP_K};

// --- env defaults & names ---
pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";
pub const DEFAULT_HOST_MIN_SUPPORT: u64 = 3;

pub const ENV_PIPELINE_CONFIG: &str = "AWARD_PIPELINE_CONFIG";
pub const ENV_LOW_CONFIDENCE_SHARE: &str = "AWARD_LOW_CONFIDENCE_SHARE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorCfg {
    pub bin_width_ms: i64,
    pub top_k: usize,
    pub expand_radius: i64,
    /// When false, extraction runs over every relevant message (untimed ones included).
    pub restrict_to_windows: bool,
}

impl Default for DetectorCfg {
    fn default() -> Self {
        Self {
            bin_width_ms: DEFAULT_BIN_WIDTH_MS,
            top_k: DEFAULT_TOP_K,
            expand_radius: DEFAULT_EXPAND_RADIUS,
            restrict_to_windows: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractorCfg {
    pub entity_pick: EntityPick,
    pub max_presenters: usize,
    pub max_hosts_per_message: usize,
    pub max_nominees_per_message: usize,
    /// Empty → built-in anchor table.
    pub anchors: Vec<AnchorCfg>,
}

impl Default for ExtractorCfg {
    fn default() -> Self {
        Self {
            entity_pick: EntityPick::First,
            max_presenters: 2,
            max_hosts_per_message: 4,
            max_nominees_per_message: 8,
            anchors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanonicalizerCfg {
    pub strategy: StrategyKind,
    pub category_threshold: f64,
    pub category_min_support: u64,
    pub entity_threshold: f64,
    pub entity_min_support: u64,
    pub headline_min_support: u64,
    pub host_min_support: u64,
    /// Optional list of known category spellings (display only).
    pub known_categories_path: Option<PathBuf>,
    pub known_cutoff: u8,
}

impl Default for CanonicalizerCfg {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Greedy,
            category_threshold: DEFAULT_CATEGORY_THRESHOLD,
            category_min_support: DEFAULT_CATEGORY_MIN_SUPPORT,
            entity_threshold: DEFAULT_ENTITY_THRESHOLD,
            entity_min_support: DEFAULT_ENTITY_MIN_SUPPORT,
            headline_min_support: DEFAULT_HEADLINE_MIN_SUPPORT,
            host_min_support: DEFAULT_HOST_MIN_SUPPORT,
            known_categories_path: None,
            known_cutoff: DEFAULT_KNOWN_CUTOFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorCfg,
    pub gate: GateCfg,
    pub extractor: ExtractorCfg,
    pub canonicalizer: CanonicalizerCfg,
    pub voter: VoterParams,
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_share_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

fn sane_unit(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

impl PipelineConfig {
    /// Load using AWARD_PIPELINE_CONFIG or "config/pipeline.toml".
    ///
    /// An explicit path must exist; a missing default file means built-in defaults.
    /// AWARD_LOW_CONFIDENCE_SHARE overrides `[voter].low_confidence_share`.
    pub fn from_toml() -> anyhow::Result<Self> {
        let explicit = env::var(ENV_PIPELINE_CONFIG).ok().map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH));

        let mut cfg = if explicit.is_none() && !path.exists() {
            info!(target: "pipeline", path = %path.display(), "no pipeline config, using defaults");
            Self::default()
        } else {
            Self::load_from(&path)?
        };

        if let Some(t) = parse_share_env(env::var(ENV_LOW_CONFIDENCE_SHARE).ok()) {
            cfg.voter.low_confidence_share = t;
        }
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to read pipeline config at {}: {}",
                path.display(),
                e
            )
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML string; absent tables and fields take their defaults.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: PipelineConfig = toml::from_str(toml_str)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        let c = &mut self.canonicalizer;
        c.category_threshold = sane_unit(c.category_threshold, DEFAULT_CATEGORY_THRESHOLD);
        c.entity_threshold = sane_unit(c.entity_threshold, DEFAULT_ENTITY_THRESHOLD);
        c.known_cutoff = c.known_cutoff.min(100);

        self.voter.low_confidence_share =
            sane_unit(self.voter.low_confidence_share, DEFAULT_LOW_CONFIDENCE_SHARE);

        if self.detector.bin_width_ms <= 0 {
            self.detector.bin_width_ms = DEFAULT_BIN_WIDTH_MS;
        }
        if self.detector.expand_radius < 0 {
            self.detector.expand_radius = 0;
        }
    }
}
