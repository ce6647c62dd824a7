// src/config/mod.rs
pub mod pipeline;

pub use crate::config::pipeline::{
    CanonicalizerCfg, DetectorCfg, ExtractorCfg, PipelineConfig, ENV_LOW_CONFIDENCE_SHARE,
    ENV_PIPELINE_CONFIG,
};
