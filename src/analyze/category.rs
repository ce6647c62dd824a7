// src/analyze/category.rs
//! Category-kind classifier: decides which entity type a category expects.

use serde::{Deserialize, Serialize};

use crate::analyze::ner::EntityKind;
use crate::canonical::normalize::tokens;

const PERSON_KEYWORDS: &[&str] = &["actor", "actress", "director", "score", "screenplay"];

const WORK_KEYWORDS: &[&str] = &[
    "picture",
    "film",
    "movie",
    "series",
    "song",
    "animated",
    "foreign",
    "television",
    "miniseries",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Person,
    Work,
    Unknown,
}

impl CategoryKind {
    /// Entity type a winner of this kind of category must have.
    pub fn wanted_entity(self) -> EntityKind {
        match self {
            CategoryKind::Person => EntityKind::Person,
            CategoryKind::Work | CategoryKind::Unknown => EntityKind::Work,
        }
    }
}

fn has_keyword(toks: &[String], keywords: &[&str]) -> bool {
    toks.iter()
        .any(|t| keywords.iter().any(|k| t.starts_with(k)))
}

/// Person keywords win over work keywords ("Best Actor in a Motion Picture").
pub fn classify(category: &str) -> CategoryKind {
    let toks = tokens(category);
    if has_keyword(&toks, PERSON_KEYWORDS) {
        CategoryKind::Person
    } else if has_keyword(&toks, WORK_KEYWORDS) {
        CategoryKind::Work
    } else {
        CategoryKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_beats_work() {
        assert_eq!(
            classify("Best Performance by an Actress in a Motion Picture"),
            CategoryKind::Person
        );
        assert_eq!(classify("Best Original Score"), CategoryKind::Person);
        assert_eq!(classify("Best Director"), CategoryKind::Person);
    }

    #[test]
    fn work_and_unknown() {
        assert_eq!(classify("Best Motion Picture - Drama"), CategoryKind::Work);
        assert_eq!(classify("Best TV Series, Comedy"), CategoryKind::Work);
        assert_eq!(classify("Best Dressed"), CategoryKind::Unknown);
        assert_eq!(CategoryKind::Unknown.wanted_entity(), EntityKind::Work);
        assert_eq!(CategoryKind::Person.wanted_entity(), EntityKind::Person);
    }
}
