// src/canonical/index.rs
//! Query-time lookup from a raw phrase to its canonical form.
//!
//! Order: containment (a cluster key that appears as a whole-token run inside the query,
//! longest wins) → best similarity at or above the tolerance → pass-through.
//! Pass-through phrases stay answerable as their own ad-hoc canonical form.

use serde::Serialize;

use crate::canonical::cluster::Cluster;
use crate::canonical::normalize::{normalize, readable_dashes, tokens};
use crate::canonical::similarity::SimilarityMeasure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub form: String,
    /// Normalized grouping key: case and punctuation variants of one phrase share it.
    pub key: String,
    /// Index into `CanonicalIndex::clusters()`, `None` for pass-through.
    pub cluster: Option<usize>,
}

impl Resolved {
    pub fn is_ad_hoc(&self) -> bool {
        self.cluster.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CanonicalIndex {
    clusters: Vec<Cluster>,
    keys: Vec<(String, usize)>,
    measure: SimilarityMeasure,
    tolerance: f64,
}

/// Token run used for matching: dashes and punctuation no longer split phrases apart.
fn token_key(s: &str) -> String {
    tokens(s).join(" ")
}

fn contains_tokens(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

impl CanonicalIndex {
    pub fn new(clusters: Vec<Cluster>, measure: SimilarityMeasure, tolerance: f64) -> Self {
        let mut keys = Vec::new();
        for (idx, c) in clusters.iter().enumerate() {
            for k in c.keys() {
                let k = token_key(&k);
                if !k.is_empty() && !keys.iter().any(|(e, i)| *e == k && *i == idx) {
                    keys.push((k, idx));
                }
            }
        }
        Self {
            clusters,
            keys,
            measure,
            tolerance,
        }
    }

    /// Index with no clusters: every lookup passes through.
    pub fn empty(measure: SimilarityMeasure, tolerance: f64) -> Self {
        Self::new(Vec::new(), measure, tolerance)
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn lookup(&self, raw: &str) -> Resolved {
        let query = token_key(raw);
        if query.is_empty() {
            return self.pass_through(raw);
        }

        // 1) containment, longest key first; ties keep the better-supported cluster
        let mut best: Option<(usize, usize)> = None; // (key_len, cluster_idx)
        for (key, idx) in &self.keys {
            if contains_tokens(&query, key) {
                let len = key.chars().count();
                let better = match best {
                    None => true,
                    Some((bl, bi)) => len > bl || (len == bl && *idx < bi),
                };
                if better {
                    best = Some((len, *idx));
                }
            }
        }
        if let Some((_, idx)) = best {
            return self.resolved(idx);
        }

        // 2) closest key within tolerance
        let mut closest: Option<(f64, usize)> = None;
        for (key, idx) in &self.keys {
            let s = self.measure.score(&query, key);
            if s < self.tolerance {
                continue;
            }
            let better = match closest {
                None => true,
                Some((bs, bi)) => s > bs || (s == bs && *idx < bi),
            };
            if better {
                closest = Some((s, *idx));
            }
        }
        if let Some((_, idx)) = closest {
            return self.resolved(idx);
        }

        self.pass_through(raw)
    }

    fn resolved(&self, idx: usize) -> Resolved {
        let c = &self.clusters[idx];
        Resolved {
            form: c.canonical_form.clone(),
            key: c.normalized.clone(),
            cluster: Some(idx),
        }
    }

    fn pass_through(&self, raw: &str) -> Resolved {
        Resolved {
            form: readable_dashes(raw.trim()),
            key: normalize(raw),
            cluster: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::cluster::{ClusterStrategy, GreedyClustering};
    use crate::canonical::tally::PhraseTally;

    fn index(items: &[(&str, u64)]) -> CanonicalIndex {
        let mut t = PhraseTally::new();
        for (s, n) in items {
            t.record_n(s, *n);
        }
        let strategy = GreedyClustering::new(SimilarityMeasure::TokenSetRatio, 0.97);
        CanonicalIndex::new(
            strategy.cluster(&t.groups()),
            SimilarityMeasure::TokenSetRatio,
            0.97,
        )
    }

    #[test]
    fn longest_containment_wins() {
        let idx = index(&[("Best Actor", 10), ("Best Actor in a Motion Picture - Drama", 4)]);
        let r = idx.lookup("best actor in a motion picture drama for Lincoln");
        assert_eq!(r.form, "Best Actor in a Motion Picture \u{2013} Drama");
        let r2 = idx.lookup("Best Actor for Lincoln");
        assert_eq!(r2.form, "Best Actor");
    }

    #[test]
    fn containment_respects_token_boundaries() {
        let idx = index(&[("Best Actor", 10)]);
        let r = idx.lookup("Best Actress");
        assert!(r.is_ad_hoc());
        assert_eq!(r.form, "Best Actress");
    }

    #[test]
    fn similarity_fallback_matches_reordered_tokens() {
        let idx = index(&[("Best Motion Picture Drama", 3)]);
        let r = idx.lookup("Drama, Best Motion Picture");
        assert_eq!(r.cluster, Some(0));
        assert_eq!(r.form, "Best Motion Picture Drama");
    }

    #[test]
    fn empty_index_passes_through() {
        let idx = CanonicalIndex::empty(SimilarityMeasure::TokenOverlap, 0.6);
        let r = idx.lookup("  Life of Pi ");
        assert_eq!(r.form, "Life of Pi");
        assert!(r.is_ad_hoc());
    }

    #[test]
    fn pass_through_variants_share_a_key() {
        let idx = index(&[("Best Actor", 10)]);
        let a = idx.lookup("Best Cecil Award");
        let b = idx.lookup("best  cecil award!");
        assert!(a.is_ad_hoc() && b.is_ad_hoc());
        assert_ne!(a.form, b.form);
        assert_eq!(a.key, b.key);
        assert_eq!(idx.lookup("best actor").key, idx.lookup("Best Actor").key);
    }
}
