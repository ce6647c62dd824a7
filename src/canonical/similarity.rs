// src/canonical/similarity.rs
//! Order-insensitive similarity measures over normalized phrases, in `[0.0, 1.0]`.
//!
//! - `TokenOverlap`:  Jaccard index of the two token sets.
//! - `TokenSetRatio`: normalized Levenshtein over the sorted, de-duplicated token strings
//!   (`strsim::normalized_levenshtein`), strict enough to keep "Drama" and "Musical or
//!   Comedy" variants of the same headline apart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

use crate::canonical::normalize::tokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    TokenOverlap,
    TokenSetRatio,
}

impl SimilarityMeasure {
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMeasure::TokenOverlap => token_overlap(a, b),
            SimilarityMeasure::TokenSetRatio => token_set_ratio(a, b),
        }
    }
}

fn token_set(s: &str) -> BTreeSet<String> {
    tokens(s).into_iter().collect()
}

/// Jaccard index over token sets. Two empty inputs are identical.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let ta = token_set(a);
    let tb = token_set(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let inter = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Sorted unique tokens joined by single spaces.
pub fn token_set_string(s: &str) -> String {
    token_set(s).into_iter().collect::<Vec<_>>().join(" ")
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&token_set_string(a), &token_set_string(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_order_insensitive() {
        let a = token_overlap("Daniel Day-Lewis", "Lewis Day Daniel");
        assert!((a - 1.0).abs() < 1e-9);
        let b = token_overlap("Ben Affleck", "Affleck");
        assert!((b - 0.5).abs() < 1e-9);
    }

    #[test]
    fn set_ratio_separates_drama_from_comedy() {
        let drama = "Best Actress in a Motion Picture - Drama";
        let comedy = "Best Actress in a Motion Picture - Comedy or Musical";
        assert!(token_set_ratio(drama, comedy) < 0.97);
        assert!(token_set_ratio(drama, "best actress, in a motion picture \u{2013} drama") >= 0.97);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(token_overlap("", ""), 1.0);
        assert_eq!(token_overlap("a b", ""), 0.0);
    }
}
