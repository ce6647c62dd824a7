// src/analyze/ner.rs
//! Named-entity capability used by the extractor, plus two local recognizers.
//!
//! The extractor only needs `typed_entities(text) -> [{text, kind}]`; any NER backend can
//! sit behind `EntityRecognizer`. Shipped implementations:
//! - `GazetteerRecognizer`: JSON files from `config/ner/` (or `NER_CONFIG_DIR`), each
//!   `{ "kind": "PERSON" | "WORK", "patterns": [{ "regex": "...", "label": "..." }] }`.
//!   Regexes must be compatible with the `regex` crate; use `(?i)` for case-insensitive.
//! - `CapitalizedSpanRecognizer`: runs of capitalized words (with inner connectors such as
//!   "of"/"the"), typed PERSON for 2–3 plain name tokens and WORK otherwise.
//!
//! `LayeredRecognizer` stacks them: gazetteer hits first, then heuristic spans that do not
//! overlap an earlier hit. Output is ordered by position.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_NER_CONFIG_DIR: &str = "NER_CONFIG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Person,
    Work,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMention {
    pub text: String,
    pub kind: EntityKind,
    /// Byte range of the matched span in the input text. `text` may be a label
    /// longer or shorter than that span.
    pub start: usize,
    pub end: usize,
    /// Recognizer confidence in `[0.0, 1.0]`.
    pub confidence: f32,
}

/// External NER capability.
pub trait EntityRecognizer: Send + Sync {
    fn typed_entities(&self, text: &str) -> Vec<EntityMention>;
}

/* ----------------------------
Gazetteer (JSON config)
---------------------------- */

#[derive(Debug, Deserialize)]
struct Pattern {
    regex: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    kind: EntityKind,
    #[serde(default)]
    patterns: Vec<Pattern>,
}

#[derive(Debug)]
struct CompiledPattern {
    re: Regex,
    label: Option<String>,
    kind: EntityKind,
}

#[derive(Debug, Default)]
pub struct GazetteerRecognizer {
    patterns: Vec<CompiledPattern>,
}

/// Resolve the directory containing NER configs:
/// - If `NER_CONFIG_DIR` is set → use it.
/// - Else use `<current_dir>/config/ner`.
pub fn ner_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_NER_CONFIG_DIR) {
        return PathBuf::from(dir);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config")
        .join("ner")
}

impl GazetteerRecognizer {
    /// Load every `*.json` in `dir`. A missing dir yields an empty recognizer;
    /// unreadable files and bad regexes are skipped with a warning.
    pub fn from_dir(dir: &Path) -> Self {
        let mut patterns = Vec::new();
        let Ok(read_dir) = fs::read_dir(dir) else {
            return Self { patterns };
        };

        let mut paths: Vec<PathBuf> = read_dir
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            match Self::load_file(&path) {
                Ok(mut v) => patterns.append(&mut v),
                Err(e) => warn!(target: "ner", file = %path.display(), error = %e, "skipping gazetteer file"),
            }
        }
        Self { patterns }
    }

    pub fn from_default_dir() -> Self {
        Self::from_dir(&ner_config_dir())
    }

    /// Build from an inline JSON document (same shape as one config file).
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self {
            patterns: Self::compile(serde_json::from_str(json)?),
        })
    }

    fn load_file(path: &Path) -> Result<Vec<CompiledPattern>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Self::compile(cfg))
    }

    fn compile(cfg: ConfigFile) -> Vec<CompiledPattern> {
        let kind = cfg.kind;
        cfg.patterns
            .into_iter()
            .filter_map(|p| match Regex::new(&p.regex) {
                Ok(re) => Some(CompiledPattern {
                    re,
                    label: p.label.filter(|l| !l.trim().is_empty()),
                    kind,
                }),
                Err(e) => {
                    warn!(target: "ner", pattern = %p.regex, error = %e, "bad gazetteer regex");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn typed_entities(&self, text: &str) -> Vec<EntityMention> {
        let mut out = Vec::new();
        for p in &self.patterns {
            for m in p.re.find_iter(text) {
                out.push(EntityMention {
                    text: p.label.clone().unwrap_or_else(|| m.as_str().to_string()),
                    kind: p.kind,
                    start: m.start(),
                    end: m.end(),
                    confidence: 1.0,
                });
            }
        }
        out.sort_by_key(|m| m.start);
        out
    }
}

/* ----------------------------
Capitalized-span heuristic
---------------------------- */

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’.\-][\p{L}\p{N}]+)*").expect("word regex"));

/// Lowercase connectors allowed between two capitalized words ("Life of Pi").
const CONNECTORS: &[&str] = &["of", "the", "a", "an", "de", "la", "le", "du", "von", "van"];

/// Capitalized words that never belong to an entity span (compared lowercase).
const STOPWORDS: &[&str] = &[
    "rt", "best", "congrats", "congratulations", "wow", "yay", "omg", "lol", "just", "so",
    "now", "finally", "winner", "winners", "award", "awards", "wins", "won", "goes",
    "presents", "presenting", "presented", "hosts", "hosted", "golden", "globe", "globes",
    "goldenglobes", "oscar", "oscars", "actor", "actress", "director", "picture", "drama",
    "comedy", "musical", "motion", "series", "song", "score", "screenplay", "supporting",
    "television", "tv", "film", "movie", "foreign", "animated", "original", "i", "tonight",
];

const ARTICLES: &[&str] = &["the", "a", "an"];

#[derive(Debug, Clone, Copy)]
pub struct CapitalizedSpanRecognizer {
    pub person_confidence: f32,
    pub work_confidence: f32,
}

impl Default for CapitalizedSpanRecognizer {
    fn default() -> Self {
        Self {
            person_confidence: 0.6,
            work_confidence: 0.5,
        }
    }
}

struct Word<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn is_capitalized(w: &str) -> bool {
    w.chars().next().is_some_and(|c| c.is_uppercase())
}

fn is_stopword(w: &str) -> bool {
    STOPWORDS.contains(&w.to_lowercase().as_str())
}

fn is_connector(w: &str) -> bool {
    CONNECTORS.contains(&w)
}

impl CapitalizedSpanRecognizer {
    fn classify(&self, words: &[Word<'_>]) -> (EntityKind, f32) {
        let plain_name = (2..=3).contains(&words.len())
            && words.iter().all(|w| {
                is_capitalized(w.text)
                    && !ARTICLES.contains(&w.text.to_lowercase().as_str())
                    && w.text.chars().all(|c| c.is_alphabetic() || matches!(c, '-' | '\'' | '’' | '.'))
            });
        if plain_name {
            (EntityKind::Person, self.person_confidence)
        } else {
            (EntityKind::Work, self.work_confidence)
        }
    }

    fn emit(&self, text: &str, span: &[Word<'_>], out: &mut Vec<EntityMention>) {
        // trailing connectors never end a span
        let mut span = span;
        while let Some(last) = span.last() {
            if is_connector(last.text) {
                span = &span[..span.len() - 1];
            } else {
                break;
            }
        }
        let (Some(first), Some(last)) = (span.first(), span.last()) else {
            return;
        };
        if span.len() == 1 && ARTICLES.contains(&first.text.to_lowercase().as_str()) {
            return;
        }
        let (kind, confidence) = self.classify(span);
        out.push(EntityMention {
            text: text[first.start..last.end].to_string(),
            kind,
            start: first.start,
            end: last.end,
            confidence,
        });
    }
}

impl EntityRecognizer for CapitalizedSpanRecognizer {
    fn typed_entities(&self, text: &str) -> Vec<EntityMention> {
        let words: Vec<Word<'_>> = WORD
            .find_iter(text)
            .map(|m| Word {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
            })
            .collect();

        let mut out = Vec::new();
        let mut span: Vec<Word<'_>> = Vec::new();

        for w in words {
            let joined_by_space = span
                .last()
                .map(|prev| text[prev.end..w.start].chars().all(char::is_whitespace))
                .unwrap_or(true);
            if !joined_by_space {
                self.emit(text, &span, &mut out);
                span.clear();
            }

            let usable = is_capitalized(w.text) && !is_stopword(w.text);
            let bridging = !span.is_empty() && is_connector(w.text);
            if usable || bridging {
                span.push(w);
            } else {
                self.emit(text, &span, &mut out);
                span.clear();
            }
        }
        self.emit(text, &span, &mut out);
        out
    }
}

/* ----------------------------
Layering
---------------------------- */

/// Recognizers consulted in order; later layers only fill gaps left by earlier ones.
#[derive(Default)]
pub struct LayeredRecognizer {
    layers: Vec<Box<dyn EntityRecognizer>>,
}

impl LayeredRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: impl EntityRecognizer + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Gazetteer from the default NER config dir, then the capitalized-span heuristic.
    pub fn standard() -> Self {
        let dir = ner_config_dir();
        let gazetteer = GazetteerRecognizer::from_dir(&dir);
        info!(target: "ner", dir = %dir.display(), patterns = gazetteer.len(), "gazetteer loaded");
        Self::new()
            .with_layer(gazetteer)
            .with_layer(CapitalizedSpanRecognizer::default())
    }
}

impl EntityRecognizer for LayeredRecognizer {
    fn typed_entities(&self, text: &str) -> Vec<EntityMention> {
        let mut kept: Vec<EntityMention> = Vec::new();
        for layer in &self.layers {
            for m in layer.typed_entities(text) {
                let overlaps = kept.iter().any(|k| m.start < k.end && k.start < m.end);
                if !overlaps {
                    kept.push(m);
                }
            }
        }
        kept.sort_by_key(|m| m.start);
        kept
    }
}
