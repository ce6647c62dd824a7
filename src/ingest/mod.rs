// src/ingest/mod.rs
//! Input records → `Message`s, plus the text cleanup applied before extraction.
//!
//! Accepted shape: a JSON array whose elements are objects
//! `{ "id"?, "timestamp_ms" | "timestamp"?, "text" }` or bare strings.
//! Anything else at the top level aborts the run.

pub mod types;

pub use crate::ingest::types::Message;

use anyhow::{anyhow, Context, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_records_total", "Records found in the input array.");
        describe_counter!(
            "ingest_skipped_total",
            "Records skipped because they were neither objects nor strings."
        );
        describe_counter!(
            "ingest_untimed_total",
            "Messages without a usable timestamp."
        );
    });
}

/// Read and parse a message file.
pub fn load_messages_from(path: &Path) -> Result<Vec<Message>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading messages from {}", path.display()))?;
    let msgs = parse_messages(&content)
        .with_context(|| format!("parsing messages from {}", path.display()))?;
    info!(target: "ingest", path = %path.display(), messages = msgs.len(), "messages loaded");
    Ok(msgs)
}

/// Parse a JSON document into messages. A non-array top level is fatal.
pub fn parse_messages(json: &str) -> Result<Vec<Message>> {
    ensure_metrics_described();
    let root: Value = serde_json::from_str(json).context("input is not valid JSON")?;
    let Value::Array(items) = root else {
        return Err(anyhow!(
            "input must be a JSON array of message records, found {}",
            kind_name(&root)
        ));
    };

    let mut out = Vec::with_capacity(items.len());
    let mut skipped = 0u64;
    for (pos, item) in items.into_iter().enumerate() {
        match message_from_value(item) {
            Some(m) => out.push(m),
            None => {
                skipped += 1;
                debug!(target: "ingest", pos, "skipping record of unsupported shape");
            }
        }
    }

    let untimed = out.iter().filter(|m| m.timestamp_ms.is_none()).count() as u64;
    counter!("ingest_records_total").increment(out.len() as u64 + skipped);
    counter!("ingest_skipped_total").increment(skipped);
    counter!("ingest_untimed_total").increment(untimed);
    Ok(out)
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn message_from_value(v: Value) -> Option<Message> {
    match v {
        Value::String(text) => Some(with_identity(None, None, text)),
        Value::Object(map) => {
            let text = match map.get("text") {
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            let id = map.get("id").and_then(id_from_value);
            let ts = map
                .get("timestamp_ms")
                .or_else(|| map.get("timestamp"))
                .and_then(parse_timestamp);
            Some(with_identity(id, ts, text))
        }
        _ => None,
    }
}

fn id_from_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Epoch millis from a number, a numeric string, or an RFC 3339 string.
pub fn parse_timestamp(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(i);
            }
            if let Ok(f) = s.parse::<f64>() {
                return f.is_finite().then_some(f as i64);
            }
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis())
        }
        _ => None,
    }
}

fn with_identity(id: Option<String>, ts: Option<i64>, text: String) -> Message {
    let id = id.unwrap_or_else(|| fallback_id(&text, ts));
    Message::new(id, ts, text)
}

/// Identity for records without an id: digest of (text, timestamp).
fn fallback_id(text: &str, ts: Option<i64>) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0x1f]);
    if let Some(ts) = ts {
        hasher.update(ts.to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Clean message text for extraction: entities, links, handles, hashtags, quotes, spaces.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip URLs, @handles, #hashtags
    static RE_NOISE: OnceCell<regex::Regex> = OnceCell::new();
    let re_noise = RE_NOISE.get_or_init(|| {
        regex::Regex::new(r"(?i)https?://\S+|www\.\S+|[@#][\p{L}\p{N}_]+").expect("noise regex")
    });
    out = re_noise.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}
