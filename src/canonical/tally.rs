// src/canonical/tally.rs
//! Run-scoped phrase accumulator: normalized key → surface variant counts.
//!
//! One tally is owned per extraction shard and the shards are merged afterwards;
//! addition is commutative, so merge order does not change the result.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::canonical::normalize::normalize;

/// Observed surface variants that share one normalized key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseGroup {
    pub normalized: String,
    pub total: u64,
    pub variants: BTreeMap<String, u64>,
}

impl PhraseGroup {
    /// Most frequent surface spelling; ties prefer the longer string, then the smaller one.
    pub fn representative(&self) -> Option<&str> {
        pick_representative(&self.variants)
    }
}

pub(crate) fn pick_representative(variants: &BTreeMap<String, u64>) -> Option<&str> {
    variants
        .iter()
        .max_by(|(a, ca), (b, cb)| {
            ca.cmp(cb)
                .then_with(|| a.chars().count().cmp(&b.chars().count()))
                .then_with(|| b.cmp(a))
        })
        .map(|(s, _)| s.as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseTally {
    groups: BTreeMap<String, BTreeMap<String, u64>>,
}

impl PhraseTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Returns the normalized key, or `None` for blank input.
    pub fn record(&mut self, surface: &str) -> Option<String> {
        self.record_n(surface, 1)
    }

    pub fn record_n(&mut self, surface: &str, count: u64) -> Option<String> {
        let surface = surface.trim();
        let key = normalize(surface);
        if key.is_empty() || count == 0 {
            return None;
        }
        *self
            .groups
            .entry(key.clone())
            .or_default()
            .entry(surface.to_string())
            .or_insert(0) += count;
        Some(key)
    }

    pub fn merge(&mut self, other: PhraseTally) {
        for (key, variants) in other.groups {
            let slot = self.groups.entry(key).or_default();
            for (surface, n) in variants {
                *slot.entry(surface).or_insert(0) += n;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of distinct normalized keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn total(&self) -> u64 {
        self.groups.values().flat_map(|v| v.values()).sum()
    }

    pub fn count_of(&self, surface: &str) -> u64 {
        self.groups
            .get(&normalize(surface))
            .map(|v| v.values().sum())
            .unwrap_or(0)
    }

    /// Groups sorted by descending total, ties by normalized key ascending.
    pub fn groups(&self) -> Vec<PhraseGroup> {
        let mut out: Vec<PhraseGroup> = self
            .groups
            .iter()
            .map(|(k, v)| PhraseGroup {
                normalized: k.clone(),
                total: v.values().sum(),
                variants: v.clone(),
            })
            .collect();
        out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.normalized.cmp(&b.normalized)));
        out
    }
}

impl<S: AsRef<str>> FromIterator<S> for PhraseTally {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tally = PhraseTally::new();
        for s in iter {
            tally.record(s.as_ref());
        }
        tally
    }
}
