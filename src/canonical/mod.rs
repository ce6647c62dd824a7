// src/canonical/mod.rs
//! Canonicalizer: clusters raw category / entity phrases into canonical forms.
//!
//! Two passes share one shape (tally → strategy → support filter → index):
//! - category phrases: token-set ratio ≥ 0.97, support ≥ 3
//! - entity names:     token overlap ≥ 0.6,  support ≥ 1
//!
//! The same construction serves host names and headline discovery with their own knobs.

pub mod cluster;
pub mod discover;
pub mod index;
pub mod known;
pub mod normalize;
pub mod similarity;
pub mod tally;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::canonical::cluster::{Cluster, ClusterStrategy, GreedyClustering, LinkageClustering};
pub use crate::canonical::index::{CanonicalIndex, Resolved};
pub use crate::canonical::known::KnownCategories;
pub use crate::canonical::normalize::normalize;
pub use crate::canonical::similarity::SimilarityMeasure;
pub use crate::canonical::tally::{PhraseGroup, PhraseTally};

pub const DEFAULT_CATEGORY_THRESHOLD: f64 = 0.97;
pub const DEFAULT_CATEGORY_MIN_SUPPORT: u64 = 3;
pub const DEFAULT_ENTITY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_ENTITY_MIN_SUPPORT: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Greedy,
    Linkage,
}

impl StrategyKind {
    pub fn build(self, measure: SimilarityMeasure, threshold: f64) -> Box<dyn ClusterStrategy> {
        match self {
            StrategyKind::Greedy => Box::new(GreedyClustering::new(measure, threshold)),
            StrategyKind::Linkage => Box::new(LinkageClustering::new(measure, threshold)),
        }
    }
}

pub struct Canonicalizer {
    label: &'static str,
    strategy: Box<dyn ClusterStrategy>,
    min_support: u64,
    known: Option<KnownCategories>,
}

impl std::fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("label", &self.label)
            .field("measure", &self.strategy.measure())
            .field("threshold", &self.strategy.threshold())
            .field("min_support", &self.min_support)
            .field("known", &self.known.as_ref().map(|k| k.names().len()))
            .finish()
    }
}

impl Canonicalizer {
    pub fn new(label: &'static str, strategy: Box<dyn ClusterStrategy>, min_support: u64) -> Self {
        Self {
            label,
            strategy,
            min_support,
            known: None,
        }
    }

    /// Category pass with default knobs (greedy, token-set ratio ≥ 0.97, support ≥ 3).
    pub fn categories() -> Self {
        Self::new(
            "category",
            StrategyKind::Greedy.build(SimilarityMeasure::TokenSetRatio, DEFAULT_CATEGORY_THRESHOLD),
            DEFAULT_CATEGORY_MIN_SUPPORT,
        )
    }

    /// Entity pass with default knobs (greedy, token overlap ≥ 0.6, support ≥ 1).
    pub fn entities() -> Self {
        Self::new(
            "entity",
            StrategyKind::Greedy.build(SimilarityMeasure::TokenOverlap, DEFAULT_ENTITY_THRESHOLD),
            DEFAULT_ENTITY_MIN_SUPPORT,
        )
    }

    pub fn with_known(mut self, known: Option<KnownCategories>) -> Self {
        self.known = known.filter(|k| !k.is_empty());
        self
    }

    pub fn min_support(&self) -> u64 {
        self.min_support
    }

    /// Cluster, drop under-supported clusters, apply known spellings, and index.
    pub fn build(&self, tally: &PhraseTally) -> CanonicalIndex {
        let groups = tally.groups();
        let clustered = self.strategy.cluster(&groups);
        let total = clustered.len();

        let mut kept: Vec<Cluster> = clustered
            .into_iter()
            .filter(|c| c.support_count >= self.min_support)
            .collect();

        if let Some(known) = &self.known {
            for c in &mut kept {
                if let Some(name) = known.snap(&c.canonical_form) {
                    c.canonical_form = name.to_string();
                }
            }
        }

        debug!(
            target: "canonical",
            pass = self.label,
            groups = groups.len(),
            clusters = total,
            kept = kept.len(),
            min_support = self.min_support,
            "clustering done"
        );

        CanonicalIndex::new(kept, self.strategy.measure(), self.strategy.threshold())
    }
}
