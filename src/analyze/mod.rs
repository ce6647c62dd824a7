// src/analyze/mod.rs
//! Relation extraction: anchor rules, category kinds, NER capability, extractor, hosts, nominees.

pub mod category;
pub mod extract;
pub mod hosts;
pub mod ner;
pub mod nominees;
pub mod rules;

// Re-export convenient types.
pub use crate::analyze::category::{classify, CategoryKind};
pub use crate::analyze::extract::{
    extract_category_phrase, Candidate, EntityPick, ExtractionBatch, Extractor, ExtractorParams,
};
pub use crate::analyze::hosts::HostMention;
pub use crate::analyze::ner::{
    CapitalizedSpanRecognizer, EntityKind, EntityMention, EntityRecognizer, GazetteerRecognizer,
    LayeredRecognizer,
};
pub use crate::analyze::nominees::NomineeMention;
pub use crate::analyze::rules::{AnchorCfg, AnchorTable, Layout, Relation};
