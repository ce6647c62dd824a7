// src/canonical/discover.rs
//! Headline category discovery straight from message texts.
//!
//! Scans for "best …" spans ended by punctuation, keeps spans that mention a plausible
//! category word, then clusters them with token overlap. Only clusters with heavy support
//! survive, which is what keeps one-off noisy posts from inventing categories.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::canonical::cluster::{Cluster, ClusterStrategy, GreedyClustering};
use crate::canonical::normalize::normalize;
use crate::canonical::similarity::SimilarityMeasure;
use crate::canonical::tally::PhraseTally;

pub const DEFAULT_HEADLINE_MIN_SUPPORT: u64 = 20;
pub const HEADLINE_OVERLAP: f64 = 0.6;

static BEST_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbest\s+[^\n.!?,;:|]{5,120}").expect("best-span regex"));

static CATEGORY_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(actor|actress|director|screenplay|picture|series|television|song|score|animated|foreign|supporting|drama|comedy|musical)\b",
    )
    .expect("category-word regex")
});

/// Collect plausible headline spans from one text into `tally`.
pub fn scan_text(text: &str, tally: &mut PhraseTally) {
    for m in BEST_SPAN.find_iter(text) {
        let raw = m.as_str().trim_matches(|c: char| c.is_whitespace() || c == '-' || c == ':');
        if CATEGORY_WORD.is_match(&normalize(raw)) {
            tally.record(raw);
        }
    }
}

/// Discover headline categories over a whole batch of texts.
pub fn discover_headlines<I, S>(texts: I, min_support: u64) -> Vec<Cluster>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tally = PhraseTally::new();
    for t in texts {
        scan_text(t.as_ref(), &mut tally);
    }
    GreedyClustering::new(SimilarityMeasure::TokenOverlap, HEADLINE_OVERLAP)
        .cluster(&tally.groups())
        .into_iter()
        .filter(|c| c.support_count >= min_support)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_supported_plausible_spans() {
        let mut texts = Vec::new();
        for _ in 0..20 {
            texts.push("And the Best Original Score goes to Mychael Danna!".to_string());
        }
        for _ in 0..25 {
            texts.push("best dressed tonight was everyone, really".to_string());
        }
        texts.push("Best Director is up next. Nervous".to_string());

        let found = discover_headlines(&texts, DEFAULT_HEADLINE_MIN_SUPPORT);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].support_count, 20);
        assert!(found[0].canonical_form.starts_with("Best Original Score"));
    }

    #[test]
    fn empty_input_discovers_nothing() {
        let none: Vec<String> = Vec::new();
        assert!(discover_headlines(none, 1).is_empty());
    }
}
