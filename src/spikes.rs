// src/spikes.rs
//! Spike detector: timestamp histogram → top-k peak buckets → expanded, merged windows.
//!
//! Pure and deterministic: the same messages and parameters always give the same windows.
//! The histogram is built in parallel (per-worker maps reduced afterwards); peak selection
//! only starts once the reduce is complete.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::ingest::Message;

pub const DEFAULT_BIN_WIDTH_MS: i64 = 60_000;
pub const DEFAULT_TOP_K: usize = 12;
pub const DEFAULT_EXPAND_RADIUS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorParams {
    pub bin_width_ms: i64,
    pub top_k: usize,
    pub expand_radius: i64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            bin_width_ms: DEFAULT_BIN_WIDTH_MS,
            top_k: DEFAULT_TOP_K,
            expand_radius: DEFAULT_EXPAND_RADIUS,
        }
    }
}

impl DetectorParams {
    /// Bin width used for bucketing; non-positive widths count as 1 ms.
    pub fn effective_bin_width(&self) -> i64 {
        self.bin_width_ms.max(1)
    }
}

/// Inclusive bucket range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Window {
    pub start_bucket: i64,
    pub end_bucket: i64,
}

impl Window {
    pub fn contains(&self, bucket: i64) -> bool {
        self.start_bucket <= bucket && bucket <= self.end_bucket
    }

    /// First millisecond covered by the window.
    pub fn start_ms(&self, bin_width_ms: i64) -> i64 {
        self.start_bucket.saturating_mul(bin_width_ms)
    }

    /// Last millisecond covered by the window.
    pub fn end_ms(&self, bin_width_ms: i64) -> i64 {
        self.end_bucket
            .saturating_add(1)
            .saturating_mul(bin_width_ms)
            .saturating_sub(1)
    }
}

pub fn bucket_of(timestamp_ms: i64, bin_width_ms: i64) -> i64 {
    timestamp_ms.div_euclid(bin_width_ms.max(1))
}

/// bucket → count over timed messages; untimed ones are skipped.
pub fn histogram(messages: &[&Message], bin_width_ms: i64) -> BTreeMap<i64, u64> {
    messages
        .par_iter()
        .filter_map(|m| m.timestamp_ms)
        .fold(BTreeMap::new, |mut acc: BTreeMap<i64, u64>, ts| {
            *acc.entry(bucket_of(ts, bin_width_ms)).or_insert(0) += 1;
            acc
        })
        .reduce(BTreeMap::new, |mut a, b| {
            for (k, v) in b {
                *a.entry(k).or_insert(0) += v;
            }
            a
        })
}

/// Top `top_k` buckets by count desc, ties by bucket asc.
pub fn select_peaks(hist: &BTreeMap<i64, u64>, top_k: usize) -> Vec<i64> {
    let mut ranked: Vec<(i64, u64)> = hist
        .iter()
        .filter(|(_, c)| **c > 0)
        .map(|(b, c)| (*b, *c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(top_k).map(|(b, _)| b).collect()
}

/// Expand each peak by `radius`, then merge adjacent-or-overlapping spans.
pub fn merge_spans(peaks: &[i64], radius: i64) -> Vec<Window> {
    let radius = radius.max(0);
    let mut spans: Vec<Window> = peaks
        .iter()
        .map(|b| Window {
            start_bucket: b.saturating_sub(radius),
            end_bucket: b.saturating_add(radius),
        })
        .collect();
    spans.sort();

    let mut merged: Vec<Window> = Vec::with_capacity(spans.len());
    for s in spans {
        match merged.last_mut() {
            Some(prev) if s.start_bucket <= prev.end_bucket.saturating_add(1) => {
                prev.end_bucket = prev.end_bucket.max(s.end_bucket);
            }
            _ => merged.push(s),
        }
    }
    merged
}

/// Full detector over messages that pass `relevant`.
pub fn detect<F>(messages: &[Message], params: &DetectorParams, relevant: F) -> Vec<Window>
where
    F: Fn(&Message) -> bool + Sync,
{
    let kept: Vec<&Message> = messages.par_iter().filter(|m| relevant(m)).collect();
    detect_filtered(&kept, params)
}

/// Detector over an already-filtered message set.
pub fn detect_filtered(messages: &[&Message], params: &DetectorParams) -> Vec<Window> {
    let hist = histogram(messages, params.effective_bin_width());
    let peaks = select_peaks(&hist, params.top_k);
    let windows = merge_spans(&peaks, params.expand_radius);
    debug!(
        target: "spikes",
        buckets = hist.len(),
        peaks = peaks.len(),
        windows = windows.len(),
        "windows selected"
    );
    windows
}

/// Index of the window containing `bucket` (windows must be sorted and disjoint).
pub fn window_index(windows: &[Window], bucket: i64) -> Option<usize> {
    let idx = windows.partition_point(|w| w.end_bucket < bucket);
    windows.get(idx).filter(|w| w.contains(bucket)).map(|_| idx)
}

/// Messages whose timestamp falls inside one of `windows`.
pub fn windowed<'a>(messages: &[&'a Message], windows: &[Window], bin_width_ms: i64) -> Vec<&'a Message> {
    messages
        .iter()
        .copied()
        .filter(|m| {
            m.timestamp_ms
                .map(|ts| window_index(windows, bucket_of(ts, bin_width_ms)).is_some())
                .unwrap_or(false)
        })
        .collect()
}

/// Per-window message counts, aligned with `windows`.
pub fn window_counts(messages: &[&Message], windows: &[Window], bin_width_ms: i64) -> Vec<u64> {
    let mut counts = vec![0u64; windows.len()];
    for ts in messages.iter().filter_map(|m| m.timestamp_ms) {
        if let Some(i) = window_index(windows, bucket_of(ts, bin_width_ms)) {
            counts[i] += 1;
        }
    }
    counts
}
