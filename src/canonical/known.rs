// src/canonical/known.rs
//! Optional list of known category spellings.
//!
//! Used only as a cosmetic bias: a learned canonical form is replaced by the closest
//! known spelling when the token-set score (0..100) reaches the cutoff. Matching keys
//! and extraction are unaffected, so a missing list never changes what is detected.
//!
//! Accepted file formats: a JSON array of strings, or plain text with one name per line
//! (`#` starts a comment line).

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::canonical::similarity::token_set_ratio;

pub const DEFAULT_KNOWN_CUTOFF: u8 = 60;

#[derive(Debug, Clone, Default)]
pub struct KnownCategories {
    names: Vec<String>,
    cutoff: u8,
}

impl KnownCategories {
    pub fn new<I, S>(names: I, cutoff: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: clean_list(names.into_iter().map(Into::into)),
            cutoff: cutoff.min(100),
        }
    }

    pub fn load_from(path: &Path, cutoff: u8) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading known categories from {}", path.display()))?;
        let names = parse_known_list(&content)?;
        Ok(Self::new(names, cutoff))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Closest known spelling at or above the cutoff; ties keep the first listed name.
    pub fn snap(&self, form: &str) -> Option<&str> {
        let mut best: Option<(u32, &str)> = None;
        for name in &self.names {
            let score = (token_set_ratio(form, name) * 100.0).round() as u32;
            if score < self.cutoff as u32 {
                continue;
            }
            if best.map(|(b, _)| score > b).unwrap_or(true) {
                best = Some((score, name.as_str()));
            }
        }
        best.map(|(_, n)| n)
    }
}

fn parse_known_list(s: &str) -> Result<Vec<String>> {
    let trimmed = s.trim_start();
    if trimmed.starts_with('[') {
        let v: Vec<String> = serde_json::from_str(trimmed)
            .map_err(|e| anyhow!("known categories: invalid JSON array: {e}"))?;
        return Ok(v);
    }
    Ok(s
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Trim, drop blanks and exact duplicates; keeps first-seen order.
fn clean_list(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_closest_known_spelling() {
        let known = KnownCategories::new(
            [
                "Best Motion Picture \u{2013} Drama",
                "Best Motion Picture \u{2013} Comedy or Musical",
            ],
            DEFAULT_KNOWN_CUTOFF,
        );
        assert_eq!(
            known.snap("Best Motion Picture Drama"),
            Some("Best Motion Picture \u{2013} Drama")
        );
        assert_eq!(known.snap("Cecil B. DeMille Award"), None);
    }

    #[test]
    fn parses_json_and_lines() {
        let json = r#"[" Best Director ", "", "Best Director", "Best Original Song"]"#;
        let lines = "# comment\nBest Director\n\n  Best Original Song  \n";
        let a = KnownCategories::new(parse_known_list(json).unwrap(), 60);
        let b = KnownCategories::new(parse_known_list(lines).unwrap(), 60);
        assert_eq!(a.names(), b.names());
        assert_eq!(a.names().len(), 2);
    }

    #[test]
    fn cutoff_is_capped_at_100() {
        let known = KnownCategories::new(["Best Director"], 250);
        assert_eq!(known.snap("best director"), Some("Best Director"));
        assert_eq!(known.snap("best directors"), None);
    }
}
