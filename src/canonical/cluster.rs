// src/canonical/cluster.rs
//! Clustering strategies over phrase groups.
//!
//! `GreedyClustering` walks groups in descending support and attaches each one to the
//! first cluster whose current canonical form is similar enough, otherwise opens a new
//! cluster. It is order-dependent by construction; the strict thresholds keep false merges
//! rare. `LinkageClustering` is the order-independent alternative: connected components
//! of the "similar enough" graph (union-find).

use serde::Serialize;
use std::collections::BTreeMap;

use crate::canonical::normalize::{normalize, readable_dashes};
use crate::canonical::similarity::SimilarityMeasure;
use crate::canonical::tally::{pick_representative, PhraseGroup};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Representative spelling (highest-support variant, ties → longer string).
    pub canonical_form: String,
    /// Comparison key of the learned canonical form (never replaced by cosmetic snapping).
    pub normalized: String,
    pub support_count: u64,
    pub variant_counts: BTreeMap<String, u64>,
}

impl Cluster {
    fn from_group(g: &PhraseGroup) -> Self {
        let mut c = Cluster {
            canonical_form: String::new(),
            normalized: String::new(),
            support_count: g.total,
            variant_counts: g.variants.clone(),
        };
        c.repick();
        c
    }

    fn absorb(&mut self, g: &PhraseGroup) {
        self.support_count += g.total;
        for (surface, n) in &g.variants {
            *self.variant_counts.entry(surface.clone()).or_insert(0) += n;
        }
        self.repick();
    }

    fn repick(&mut self) {
        if let Some(rep) = pick_representative(&self.variant_counts) {
            self.canonical_form = readable_dashes(rep);
            self.normalized = normalize(rep);
        }
    }

    /// Up to `n` surface variants, most frequent first.
    pub fn top_variants(&self, n: usize) -> Vec<(String, u64)> {
        let mut v: Vec<(String, u64)> = self
            .variant_counts
            .iter()
            .map(|(s, c)| (s.clone(), *c))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        v.truncate(n);
        v
    }

    /// Every normalized key this cluster answers to (canonical first).
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![self.normalized.clone()];
        for surface in self.variant_counts.keys() {
            let k = normalize(surface);
            if !keys.contains(&k) {
                keys.push(k);
            }
        }
        keys
    }
}

/// Pluggable clustering algorithm.
pub trait ClusterStrategy: Send + Sync {
    /// Cluster the groups; output is sorted by support descending, then canonical form.
    fn cluster(&self, groups: &[PhraseGroup]) -> Vec<Cluster>;

    fn measure(&self) -> SimilarityMeasure;

    fn threshold(&self) -> f64;
}

fn sort_clusters(clusters: &mut [Cluster]) {
    clusters.sort_by(|a, b| {
        b.support_count
            .cmp(&a.support_count)
            .then_with(|| a.canonical_form.cmp(&b.canonical_form))
    });
}

fn ordered(groups: &[PhraseGroup]) -> Vec<&PhraseGroup> {
    let mut v: Vec<&PhraseGroup> = groups.iter().collect();
    v.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.normalized.cmp(&b.normalized)));
    v
}

#[derive(Debug, Clone, Copy)]
pub struct GreedyClustering {
    pub measure: SimilarityMeasure,
    pub threshold: f64,
}

impl GreedyClustering {
    pub fn new(measure: SimilarityMeasure, threshold: f64) -> Self {
        Self {
            measure,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

impl ClusterStrategy for GreedyClustering {
    fn cluster(&self, groups: &[PhraseGroup]) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = Vec::new();
        for g in ordered(groups) {
            let hit = clusters
                .iter_mut()
                .find(|c| self.measure.score(&g.normalized, &c.normalized) >= self.threshold);
            match hit {
                Some(c) => c.absorb(g),
                None => clusters.push(Cluster::from_group(g)),
            }
        }
        sort_clusters(&mut clusters);
        clusters
    }

    fn measure(&self) -> SimilarityMeasure {
        self.measure
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinkageClustering {
    pub measure: SimilarityMeasure,
    pub threshold: f64,
}

impl LinkageClustering {
    pub fn new(measure: SimilarityMeasure, threshold: f64) -> Self {
        Self {
            measure,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // lower index stays root so components keep a stable anchor
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

impl ClusterStrategy for LinkageClustering {
    fn cluster(&self, groups: &[PhraseGroup]) -> Vec<Cluster> {
        let groups = ordered(groups);
        let n = groups.len();
        let mut set = DisjointSet::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if self.measure.score(&groups[i].normalized, &groups[j].normalized)
                    >= self.threshold
                {
                    set.union(i, j);
                }
            }
        }

        let mut by_root: BTreeMap<usize, Cluster> = BTreeMap::new();
        for (i, g) in groups.iter().enumerate() {
            let root = set.find(i);
            match by_root.get_mut(&root) {
                Some(c) => c.absorb(g),
                None => {
                    by_root.insert(root, Cluster::from_group(g));
                }
            }
        }

        let mut clusters: Vec<Cluster> = by_root.into_values().collect();
        sort_clusters(&mut clusters);
        clusters
    }

    fn measure(&self) -> SimilarityMeasure {
        self.measure
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::tally::PhraseTally;

    fn groups(items: &[(&str, u64)]) -> Vec<PhraseGroup> {
        let mut t = PhraseTally::new();
        for (s, n) in items {
            t.record_n(s, *n);
        }
        t.groups()
    }

    #[test]
    fn greedy_merges_near_duplicates_and_repicks_canonical() {
        let g = groups(&[
            ("Best Motion Picture - Drama", 5),
            ("Best Motion Picture Drama", 7),
            ("Best Motion Picture - Comedy or Musical", 4),
        ]);
        let clusters = GreedyClustering::new(SimilarityMeasure::TokenSetRatio, 0.97).cluster(&g);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].support_count, 12);
        assert_eq!(clusters[0].canonical_form, "Best Motion Picture Drama");
        assert_eq!(clusters[1].canonical_form, "Best Motion Picture \u{2013} Comedy or Musical");
    }

    #[test]
    fn canonical_tie_prefers_longer_surface() {
        let g = groups(&[("Ben Affleck", 2), ("Ben  Affleck!", 2)]);
        let clusters = GreedyClustering::new(SimilarityMeasure::TokenOverlap, 0.6).cluster(&g);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].canonical_form, "Ben Affleck!");
        assert_eq!(clusters[0].support_count, 4);
    }

    #[test]
    fn linkage_joins_chains_greedy_does_not() {
        // a~b and b~c but a !~ c at 0.6 overlap
        let g = groups(&[("red green blue", 3), ("green blue", 2), ("green blue yellow", 1)]);
        let greedy = GreedyClustering::new(SimilarityMeasure::TokenOverlap, 0.6).cluster(&g);
        let linkage = LinkageClustering::new(SimilarityMeasure::TokenOverlap, 0.6).cluster(&g);
        assert_eq!(greedy.len(), 2);
        assert_eq!(linkage.len(), 1);
        assert_eq!(linkage[0].support_count, 6);
    }

    #[test]
    fn top_variants_are_ordered() {
        let g = groups(&[("Argo", 3), ("ARGO", 1), ("argo", 2)]);
        let c = GreedyClustering::new(SimilarityMeasure::TokenOverlap, 0.6).cluster(&g);
        assert_eq!(
            c[0].top_variants(2),
            vec![("Argo".to_string(), 3), ("argo".to_string(), 2)]
        );
    }
}
