// src/analyze/extract.rs
//! Relation extractor: anchor split → category phrase → typed entity.
//!
//! Rules run in priority order and the first one that yields a candidate wins, so a
//! sentence is never counted under two readings. Every accepted category phrase is
//! recorded into the caller's `PhraseTally`, which is how categories get learned.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::analyze::category::{classify, CategoryKind};
use crate::analyze::hosts::HostMention;
use crate::analyze::nominees::NomineeMention;
use crate::analyze::ner::{EntityKind, EntityMention, EntityRecognizer};
use crate::analyze::rules::{AnchorTable, Layout, Relation};
use crate::canonical::normalize::normalize;
use crate::canonical::tally::PhraseTally;
use crate::ingest::Message;

/// Messages per parallel extraction shard.
const SHARD_SIZE: usize = 256;

/// Minimum normalized length of an accepted category phrase (chars).
const MIN_CATEGORY_LEN: usize = 8;

static BEST_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bbest\s+[^\n.!?;:|"()\[\]{}#@]{3,120}"#).expect("best-span regex")
});

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?;:|]").expect("sentence-end regex"));

/// How to choose among several entity mentions of the wanted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityPick {
    /// First mention by position.
    #[default]
    First,
    /// Highest recognizer confidence; earlier position on ties.
    MostConfident,
    /// Only when exactly one distinct mention is present; abstain otherwise.
    Unique,
}

impl EntityPick {
    fn pick<'a>(self, mentions: &'a [EntityMention]) -> Option<&'a EntityMention> {
        match self {
            EntityPick::First => mentions.first(),
            EntityPick::MostConfident => mentions.iter().reduce(|best, m| {
                if m.confidence > best.confidence {
                    m
                } else {
                    best
                }
            }),
            EntityPick::Unique => {
                let first = mentions.first()?;
                let key = normalize(&first.text);
                mentions
                    .iter()
                    .all(|m| normalize(&m.text) == key)
                    .then_some(first)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorParams {
    pub entity_pick: EntityPick,
    pub max_presenters: usize,
    pub max_hosts_per_message: usize,
    pub max_nominees_per_message: usize,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            entity_pick: EntityPick::First,
            max_presenters: 2,
            max_hosts_per_message: 4,
            max_nominees_per_message: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub category_phrase: String,
    pub category_kind: CategoryKind,
    pub entity_phrase: String,
    /// Which side of the link held the category phrase.
    pub layout: Layout,
    pub relation: Relation,
    pub rule_id: String,
    pub source_message_id: String,
}

/// Output of a batch run: candidates and side mentions in input order plus the merged
/// category tally.
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    pub candidates: Vec<Candidate>,
    pub host_mentions: Vec<HostMention>,
    pub nominee_mentions: Vec<NomineeMention>,
    pub learned: PhraseTally,
}

/// Pull a category phrase from one side of a split.
///
/// Looks for a "best …" span, falls back to the whole side, cuts at the first strong
/// punctuation, and requires "best" plus a minimal normalized length.
pub fn extract_category_phrase(side: &str) -> Option<String> {
    let span = BEST_SPAN.find(side).map(|m| m.as_str()).unwrap_or(side);
    let cut = match SENTENCE_END.find(span) {
        Some(m) => &span[..m.start()],
        None => span,
    };
    let phrase = cut.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '—' | '–' | '~' | '·' | '•' | ',')
    });
    if !phrase.to_lowercase().contains("best") {
        return None;
    }
    if normalize(phrase).chars().count() < MIN_CATEGORY_LEN {
        return None;
    }
    Some(phrase.to_string())
}

pub struct Extractor {
    rules: AnchorTable,
    recognizer: Arc<dyn EntityRecognizer>,
    params: ExtractorParams,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("rules", &self.rules.rules().len())
            .field("params", &self.params)
            .finish()
    }
}

impl Extractor {
    pub fn new(rules: AnchorTable, recognizer: Arc<dyn EntityRecognizer>, params: ExtractorParams) -> Self {
        Self {
            rules,
            recognizer,
            params,
        }
    }

    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    pub(crate) fn recognizer(&self) -> &dyn EntityRecognizer {
        self.recognizer.as_ref()
    }

    /// Candidates from one text; records accepted category phrases into `learned`.
    pub fn extract(&self, message_id: &str, text: &str, learned: &mut PhraseTally) -> Vec<Candidate> {
        for rule in self.rules.rules() {
            let Some(split) = rule.split(text) else {
                continue;
            };
            let (category_side, entity_side) = rule.sides(&split);

            let Some(category) = extract_category_phrase(category_side) else {
                continue;
            };
            learned.record(&category);

            let kind = classify(&category);
            let wanted = match rule.relation {
                Relation::Presenter => EntityKind::Person,
                Relation::Winner => kind.wanted_entity(),
            };
            let mentions: Vec<EntityMention> = self
                .recognizer
                .typed_entities(entity_side)
                .into_iter()
                .filter(|m| m.kind == wanted && !m.text.trim().is_empty())
                .collect();

            let entities: Vec<String> = match rule.relation {
                Relation::Winner => self
                    .params
                    .entity_pick
                    .pick(&mentions)
                    .map(|m| vec![m.text.trim().to_string()])
                    .unwrap_or_default(),
                Relation::Presenter => distinct_names(&mentions, self.params.max_presenters),
            };
            if entities.is_empty() {
                continue;
            }

            return entities
                .into_iter()
                .map(|entity| Candidate {
                    category_phrase: category.clone(),
                    category_kind: kind,
                    entity_phrase: entity,
                    layout: rule.layout,
                    relation: rule.relation,
                    rule_id: rule.id.clone(),
                    source_message_id: message_id.to_string(),
                })
                .collect();
        }
        Vec::new()
    }

    /// Parallel extraction over `messages`; each shard keeps its own tally, merged at the end.
    pub fn extract_batch(&self, messages: &[&Message]) -> ExtractionBatch {
        let shards: Vec<ExtractionBatch> = messages
            .par_chunks(SHARD_SIZE)
            .map(|chunk| {
                let mut shard = ExtractionBatch::default();
                for m in chunk {
                    let found = self.extract(&m.id, &m.text, &mut shard.learned);
                    shard.candidates.extend(found);
                    shard.host_mentions.extend(self.extract_hosts(&m.id, &m.text));
                    shard.nominee_mentions.extend(self.extract_nominees(&m.id, &m.text));
                }
                shard
            })
            .collect();

        let mut out = ExtractionBatch::default();
        for shard in shards {
            out.candidates.extend(shard.candidates);
            out.host_mentions.extend(shard.host_mentions);
            out.nominee_mentions.extend(shard.nominee_mentions);
            out.learned.merge(shard.learned);
        }
        out
    }
}

/// Distinct (by normalized form) mention texts in position order, at most `max`.
pub(crate) fn distinct_names(mentions: &[EntityMention], max: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for m in mentions {
        if out.len() >= max {
            break;
        }
        let name = m.text.trim();
        if seen.insert(normalize(name)) {
            out.push(name.to_string());
        }
    }
    out
}
