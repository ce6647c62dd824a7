// src/pipeline.rs
//! One batch run: gate → spike windows → extraction → clustering → election and roll-ups.
//!
//! Every stage hands the next a fully materialized collection. Extraction is sharded
//! across rayon workers; the clustering passes are independent and run concurrently;
//! the vote only starts once both indexes are complete.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::analyze::{
    AnchorTable, Candidate, EntityRecognizer, Extractor, ExtractorParams, HostMention,
    NomineeMention, Relation,
};
use crate::canonical::discover::discover_headlines;
use crate::canonical::{
    Canonicalizer, CanonicalIndex, Cluster, KnownCategories, PhraseTally, SimilarityMeasure,
};
use crate::config::PipelineConfig;
use crate::consensus::{ElectionResult, HostResult, NomineeResult, PresenterResult, Voter};
use crate::ingest::{clean_text, Message};
use crate::relevance::RelevanceGate;
use crate::spikes::{self, DetectorParams, Window};

/// Variant spellings listed per cluster in reports.
const REPORT_TOP_VARIANTS: usize = 5;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_messages_total", "Messages handed to the pipeline.");
        describe_counter!("pipeline_relevant_total", "Messages that passed the relevance gate.");
        describe_counter!("pipeline_windows_total", "Spike windows selected.");
        describe_counter!("pipeline_candidates_total", "Candidates produced by the extractor.");
        describe_counter!("pipeline_elections_total", "Categories with an elected winner.");
        describe_counter!(
            "pipeline_low_confidence_total",
            "Elections whose winner share fell below the threshold."
        );
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowReport {
    pub start_bucket: i64,
    pub end_bucket: i64,
    pub start_utc: Option<String>,
    pub end_utc: Option<String>,
    pub message_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterReport {
    pub canonical_form: String,
    pub normalized: String,
    pub support_count: u64,
    pub top_variants: Vec<(String, u64)>,
}

impl From<&Cluster> for ClusterReport {
    fn from(c: &Cluster) -> Self {
        Self {
            canonical_form: c.canonical_form.clone(),
            normalized: c.normalized.clone(),
            support_count: c.support_count,
            top_variants: c.top_variants(REPORT_TOP_VARIANTS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub messages: u64,
    pub relevant: u64,
    pub untimed: u64,
    pub extracted_from: u64,
    pub candidates: u64,
    pub host_mentions: u64,
    pub nominee_mentions: u64,
    pub elections: u64,
    pub low_confidence: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutput {
    pub windows: Vec<WindowReport>,
    pub candidates: Vec<Candidate>,
    pub host_mentions: Vec<HostMention>,
    pub nominee_mentions: Vec<NomineeMention>,
    pub category_clusters: Vec<ClusterReport>,
    pub entity_clusters: Vec<ClusterReport>,
    /// Frequent "best …" n-grams across the scoped text; reported only.
    pub headline_categories: Vec<ClusterReport>,
    pub host_clusters: Vec<ClusterReport>,
    pub elections: Vec<ElectionResult>,
    pub presenters: Vec<PresenterResult>,
    pub hosts: Vec<HostResult>,
    pub nominees: Vec<NomineeResult>,
    pub stats: RunStats,
}

fn utc(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn reports(index: &CanonicalIndex) -> Vec<ClusterReport> {
    index.clusters().iter().map(ClusterReport::from).collect()
}

#[derive(Debug)]
pub struct Pipeline {
    detector: DetectorParams,
    restrict_to_windows: bool,
    headline_min_support: u64,
    gate: RelevanceGate,
    extractor: Extractor,
    categories: Canonicalizer,
    entities: Canonicalizer,
    people: Canonicalizer,
    hosts: Canonicalizer,
    nominees: Canonicalizer,
    voter: Voter,
}

impl Pipeline {
    /// Compile every configured piece up front; regex or file errors surface here.
    pub fn from_config(cfg: &PipelineConfig, recognizer: Arc<dyn EntityRecognizer>) -> Result<Self> {
        let gate = RelevanceGate::from_cfg(&cfg.gate)?;

        let rules = if cfg.extractor.anchors.is_empty() {
            AnchorTable::builtin()
        } else {
            AnchorTable::from_cfgs(&cfg.extractor.anchors)?
        };
        let extractor = Extractor::new(
            rules,
            recognizer,
            ExtractorParams {
                entity_pick: cfg.extractor.entity_pick,
                max_presenters: cfg.extractor.max_presenters,
                max_hosts_per_message: cfg.extractor.max_hosts_per_message,
                max_nominees_per_message: cfg.extractor.max_nominees_per_message,
            },
        );

        let c = &cfg.canonicalizer;
        let known = match &c.known_categories_path {
            Some(path) => Some(KnownCategories::load_from(path, c.known_cutoff)?),
            None => None,
        };
        let categories = Canonicalizer::new(
            "category",
            c.strategy.build(SimilarityMeasure::TokenSetRatio, c.category_threshold),
            c.category_min_support,
        )
        .with_known(known);
        let entity_pass = |label: &'static str, min_support: u64| {
            Canonicalizer::new(
                label,
                c.strategy.build(SimilarityMeasure::TokenOverlap, c.entity_threshold),
                min_support,
            )
        };

        Ok(Self {
            detector: DetectorParams {
                bin_width_ms: cfg.detector.bin_width_ms,
                top_k: cfg.detector.top_k,
                expand_radius: cfg.detector.expand_radius,
            },
            restrict_to_windows: cfg.detector.restrict_to_windows,
            headline_min_support: c.headline_min_support,
            gate,
            extractor,
            categories,
            entities: entity_pass("entity", c.entity_min_support),
            people: entity_pass("presenter", c.entity_min_support),
            hosts: entity_pass("host", c.host_min_support),
            nominees: entity_pass("nominee", c.entity_min_support),
            voter: Voter::new(cfg.voter),
        })
    }

    pub fn run(&self, messages: &[Message]) -> PipelineOutput {
        ensure_metrics_described();
        let bin_width = self.detector.effective_bin_width();

        // 1) gate
        let relevant: Vec<&Message> = messages
            .par_iter()
            .filter(|m| self.gate.is_relevant(&m.text))
            .collect();

        // 2) windows
        let windows: Vec<Window> = spikes::detect_filtered(&relevant, &self.detector);
        let counts = spikes::window_counts(&relevant, &windows, bin_width);
        let scope: Vec<&Message> = if self.restrict_to_windows {
            spikes::windowed(&relevant, &windows, bin_width)
        } else {
            relevant.clone()
        };

        // 3) extraction over cleaned text
        let cleaned: Vec<Message> = scope
            .par_iter()
            .map(|m| Message::new(m.id.clone(), m.timestamp_ms, clean_text(&m.text)))
            .collect();
        let cleaned_refs: Vec<&Message> = cleaned.iter().collect();
        let batch = self.extractor.extract_batch(&cleaned_refs);

        // 4) canonical indexes, independent passes side by side
        let names = |relation: Relation| -> PhraseTally {
            batch
                .candidates
                .iter()
                .filter(|c| c.relation == relation)
                .map(|c| c.entity_phrase.as_str())
                .collect()
        };
        let winner_names = names(Relation::Winner);
        let presenter_names = names(Relation::Presenter);
        let host_names: PhraseTally = batch.host_mentions.iter().map(|h| h.name.as_str()).collect();
        let nominee_names: PhraseTally = batch.nominee_mentions.iter().map(|n| n.name.as_str()).collect();

        let (((category_idx, entity_idx), nominee_idx), ((people_idx, host_idx), headlines)) = rayon::join(
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || self.categories.build(&batch.learned),
                            || self.entities.build(&winner_names),
                        )
                    },
                    || self.nominees.build(&nominee_names),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || self.people.build(&presenter_names),
                            || self.hosts.build(&host_names),
                        )
                    },
                    || {
                        discover_headlines(
                            cleaned.iter().map(|m| m.text.as_str()),
                            self.headline_min_support,
                        )
                    },
                )
            },
        );

        // 5) vote
        let elections = self.voter.elect(&batch.candidates, &category_idx, &entity_idx);
        let presenters = self.voter.presenters(&batch.candidates, &category_idx, &people_idx);
        let hosts = self.voter.hosts(&host_idx);
        let nominees = self.voter.nominees(&batch.nominee_mentions, &category_idx, &nominee_idx);

        let stats = RunStats {
            messages: messages.len() as u64,
            relevant: relevant.len() as u64,
            untimed: relevant.iter().filter(|m| m.timestamp_ms.is_none()).count() as u64,
            extracted_from: cleaned.len() as u64,
            candidates: batch.candidates.len() as u64,
            host_mentions: batch.host_mentions.len() as u64,
            nominee_mentions: batch.nominee_mentions.len() as u64,
            elections: elections.len() as u64,
            low_confidence: elections.iter().filter(|e| e.low_confidence_flag).count() as u64,
        };
        counter!("pipeline_messages_total").increment(stats.messages);
        counter!("pipeline_relevant_total").increment(stats.relevant);
        counter!("pipeline_windows_total").increment(windows.len() as u64);
        counter!("pipeline_candidates_total").increment(stats.candidates);
        counter!("pipeline_elections_total").increment(stats.elections);
        counter!("pipeline_low_confidence_total").increment(stats.low_confidence);

        info!(
            target: "pipeline",
            messages = stats.messages,
            relevant = stats.relevant,
            windows = windows.len(),
            candidates = stats.candidates,
            categories = category_idx.clusters().len(),
            elections = stats.elections,
            low_confidence = stats.low_confidence,
            "run complete"
        );

        PipelineOutput {
            windows: windows
                .iter()
                .zip(counts)
                .map(|(w, n)| WindowReport {
                    start_bucket: w.start_bucket,
                    end_bucket: w.end_bucket,
                    start_utc: utc(w.start_ms(bin_width)),
                    end_utc: utc(w.end_ms(bin_width)),
                    message_count: n,
                })
                .collect(),
            category_clusters: reports(&category_idx),
            entity_clusters: reports(&entity_idx),
            headline_categories: headlines.iter().map(ClusterReport::from).collect(),
            host_clusters: reports(&host_idx),
            candidates: batch.candidates,
            host_mentions: batch.host_mentions,
            nominee_mentions: batch.nominee_mentions,
            elections,
            presenters,
            hosts,
            nominees,
            stats,
        }
    }
}
