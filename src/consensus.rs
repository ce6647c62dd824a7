// src/consensus.rs
//! Consensus voter: replays canonicalized candidates into per-category tallies and
//! elects a plurality winner with a confidence share.
//!
//! Ties on vote count go to the lexicographically smallest canonical entity name, so
//! repeated runs over the same candidates always agree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::analyze::{Candidate, NomineeMention, Relation};
use crate::canonical::tally::pick_representative;
use crate::canonical::CanonicalIndex;

pub const DEFAULT_LOW_CONFIDENCE_SHARE: f64 = 0.55;
pub const DEFAULT_MAX_RUNNER_UPS: usize = 5;
pub const DEFAULT_MAX_PRESENTERS: usize = 2;
pub const DEFAULT_MAX_HOSTS: usize = 2;
pub const DEFAULT_MAX_NOMINEES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoterParams {
    pub low_confidence_share: f64,
    pub max_runner_ups: usize,
    pub max_presenters: usize,
    pub max_hosts: usize,
    pub max_nominees: usize,
}

impl Default for VoterParams {
    fn default() -> Self {
        Self {
            low_confidence_share: DEFAULT_LOW_CONFIDENCE_SHARE,
            max_runner_ups: DEFAULT_MAX_RUNNER_UPS,
            max_presenters: DEFAULT_MAX_PRESENTERS,
            max_hosts: DEFAULT_MAX_HOSTS,
            max_nominees: DEFAULT_MAX_NOMINEES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub entity: String,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectionResult {
    pub category: String,
    pub winner: String,
    pub votes_for_winner: u64,
    pub total_votes: u64,
    pub winner_share: f64,
    pub low_confidence_flag: bool,
    pub runner_ups: Vec<Vote>,
    /// Category did not resolve to a retained cluster.
    pub ad_hoc_category: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenterResult {
    pub category: String,
    pub presenters: Vec<Vote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostResult {
    pub name: String,
    pub mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NomineeResult {
    pub category: String,
    pub nominees: Vec<Vote>,
}

/// Surface forms counted under one normalized key.
#[derive(Debug, Default)]
struct Forms(BTreeMap<String, u64>);

impl Forms {
    fn add(&mut self, form: String) {
        *self.0.entry(form).or_insert(0) += 1;
    }

    fn total(&self) -> u64 {
        self.0.values().sum()
    }

    fn display(&self) -> String {
        pick_representative(&self.0).map(str::to_string).unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct CategoryTally {
    ad_hoc: bool,
    names: Forms,
    /// Entity key → surface forms voted under it.
    votes: BTreeMap<String, Forms>,
}

impl CategoryTally {
    fn total(&self) -> u64 {
        self.votes.values().map(Forms::total).sum()
    }
}

/// Votes ranked by count desc, then name asc.
fn ranked(votes: &BTreeMap<String, Forms>) -> Vec<Vote> {
    let mut v: Vec<Vote> = votes
        .values()
        .map(|forms| Vote {
            entity: forms.display(),
            votes: forms.total(),
        })
        .collect();
    v.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.entity.cmp(&b.entity)));
    v
}

/// Tallies keyed by normalized category, returned as (display form, tally) sorted by display.
fn by_display(tallies: BTreeMap<String, CategoryTally>) -> Vec<(String, CategoryTally)> {
    let mut out: Vec<(String, CategoryTally)> = tallies
        .into_values()
        .map(|t| (t.names.display(), t))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

#[derive(Debug, Clone, Default)]
pub struct Voter {
    params: VoterParams,
}

impl Voter {
    pub fn new(params: VoterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &VoterParams {
        &self.params
    }

    /// Category tallies from (category phrase, entity phrase) pairs.
    ///
    /// Both sides group by normalized key, so case or punctuation variants of an
    /// unresolved phrase land in one tally.
    fn tally<'a>(
        &self,
        pairs: impl Iterator<Item = (&'a str, &'a str)>,
        categories: &CanonicalIndex,
        names: &CanonicalIndex,
    ) -> BTreeMap<String, CategoryTally> {
        let mut out: BTreeMap<String, CategoryTally> = BTreeMap::new();
        for (category, entity) in pairs {
            let cat = categories.lookup(category);
            let ent = names.lookup(entity);
            if cat.key.is_empty() || ent.key.is_empty() {
                continue;
            }
            let entry = out.entry(cat.key).or_insert_with(|| CategoryTally {
                ad_hoc: true,
                ..CategoryTally::default()
            });
            // one resolved phrase is enough to call the category learned
            entry.ad_hoc &= cat.cluster.is_none();
            entry.names.add(cat.form);
            entry.votes.entry(ent.key).or_default().add(ent.form);
        }
        out
    }

    fn relation_pairs(
        candidates: &[Candidate],
        relation: Relation,
    ) -> impl Iterator<Item = (&str, &str)> {
        candidates
            .iter()
            .filter(move |c| c.relation == relation)
            .map(|c| (c.category_phrase.as_str(), c.entity_phrase.as_str()))
    }

    /// One result per category with at least one surviving winner vote, sorted by category.
    pub fn elect(
        &self,
        candidates: &[Candidate],
        categories: &CanonicalIndex,
        entities: &CanonicalIndex,
    ) -> Vec<ElectionResult> {
        let tallies = self.tally(
            Self::relation_pairs(candidates, Relation::Winner),
            categories,
            entities,
        );
        let mut results = Vec::with_capacity(tallies.len());

        for (category, t) in by_display(tallies) {
            let mut ranking = ranked(&t.votes).into_iter();
            let Some(top) = ranking.next() else {
                continue;
            };
            let total = t.total();
            let share = top.votes as f64 / total as f64;
            let result = ElectionResult {
                category,
                winner: top.entity,
                votes_for_winner: top.votes,
                total_votes: total,
                winner_share: share,
                low_confidence_flag: share < self.params.low_confidence_share,
                runner_ups: ranking.take(self.params.max_runner_ups).collect(),
                ad_hoc_category: t.ad_hoc,
            };
            debug!(
                target: "consensus",
                category = %result.category,
                winner = %result.winner,
                share = result.winner_share,
                low_confidence = result.low_confidence_flag,
                "elected"
            );
            results.push(result);
        }
        results
    }

    /// Top presenters per category, sorted by category.
    pub fn presenters(
        &self,
        candidates: &[Candidate],
        categories: &CanonicalIndex,
        people: &CanonicalIndex,
    ) -> Vec<PresenterResult> {
        by_display(self.tally(
            Self::relation_pairs(candidates, Relation::Presenter),
            categories,
            people,
        ))
        .into_iter()
        .map(|(category, t)| PresenterResult {
            category,
            presenters: ranked(&t.votes)
                .into_iter()
                .take(self.params.max_presenters)
                .collect(),
        })
        .filter(|p| !p.presenters.is_empty())
        .collect()
    }

    /// Most mentioned nominees per category, sorted by category.
    pub fn nominees(
        &self,
        mentions: &[NomineeMention],
        categories: &CanonicalIndex,
        nominees: &CanonicalIndex,
    ) -> Vec<NomineeResult> {
        let pairs = mentions
            .iter()
            .map(|m| (m.category_phrase.as_str(), m.name.as_str()));
        by_display(self.tally(pairs, categories, nominees))
            .into_iter()
            .map(|(category, t)| NomineeResult {
                category,
                nominees: ranked(&t.votes)
                    .into_iter()
                    .take(self.params.max_nominees)
                    .collect(),
            })
            .filter(|n| !n.nominees.is_empty())
            .collect()
    }

    /// Best-supported host clusters, at most `max_hosts`.
    pub fn hosts(&self, host_index: &CanonicalIndex) -> Vec<HostResult> {
        let mut hosts: Vec<HostResult> = host_index
            .clusters()
            .iter()
            .map(|c| HostResult {
                name: c.canonical_form.clone(),
                mentions: c.support_count,
            })
            .collect();
        hosts.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));
        hosts.truncate(self.params.max_hosts);
        hosts
    }
}
