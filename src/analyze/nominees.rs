// src/analyze/nominees.rs
//! Nominee lists: "Best … nominees: A, B and C".
//!
//! Nominees may be people or works, so names are split from the list tail rather than
//! picked by entity type.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::analyze::extract::{extract_category_phrase, Extractor};
use crate::canonical::normalize::normalize;

static NOMINEES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\b(best\s+[^.!?\n]{3,120}?)\s*\bnominees?\b\s*(?:are|include)?\s*[:\-]\s*(.+)$")
        .expect("nominees regex")
});

static LIST_SEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*|\s+and\s+|\s*&\s*").expect("list separator regex"));

static LIST_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!?;|\n]|\.\s").expect("list end regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NomineeMention {
    pub category_phrase: String,
    pub name: String,
    pub source_message_id: String,
}

fn clean_name(part: &str) -> &str {
    part.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '“' | '”' | '’' | '.'))
}

impl Extractor {
    /// Distinct names listed after "Best … nominees:", up to `max_nominees_per_message`.
    pub fn extract_nominees(&self, message_id: &str, text: &str) -> Vec<NomineeMention> {
        let Some(caps) = NOMINEES.captures(text) else {
            return Vec::new();
        };
        let (Some(head), Some(tail)) = (caps.get(1), caps.get(2)) else {
            return Vec::new();
        };
        let Some(category) = extract_category_phrase(head.as_str()) else {
            return Vec::new();
        };
        let list = match LIST_END.find(tail.as_str()) {
            Some(m) => &tail.as_str()[..m.start()],
            None => tail.as_str(),
        };

        let max = self.params().max_nominees_per_message;
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for part in LIST_SEP.split(list) {
            if out.len() >= max {
                break;
            }
            let name = clean_name(part);
            if name.chars().count() < 2 || !seen.insert(normalize(name)) {
                continue;
            }
            out.push(NomineeMention {
                category_phrase: category.clone(),
                name: name.to_string(),
                source_message_id: message_id.to_string(),
            });
        }
        out
    }
}
