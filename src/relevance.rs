// src/relevance.rs
//! Relevance gate: cheap keyword predicate applied before any counting.
//!
//! Order: reshare exclusion → blockers (veto patterns) → keyword pattern.

use regex::Regex;
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_GATE_PATTERN: &str =
    r"(?i)\b(wins?|won|winner|award(s|ed)?|goes\s+to|best|present(s|ed|ing)?|host(s|ed)?)\b";

const RESHARE_PATTERN: &str = r"(?i)^\s*rt\b|\brt\s+@";

// Dev logging gate: AWARD_GATE_DEV_LOG=1 AND dev env (debug or AWARD_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("AWARD_GATE_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("AWARD_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short anonymised id for log lines: first 6 bytes of SHA-256, hex.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Minimal, anonymized dev logger for gate rejections.
fn dev_log_gate(text: &str, verdict: &GateVerdict) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(text);
    let blockers_short = truncate_vec(&verdict.blockers, 5);
    // Never log raw text. Only hashed id + short lists.
    info!(
        target: "relevance",
        %id,
        relevant = verdict.relevant,
        reshare = verdict.reshare,
        keyword = verdict.keyword,
        blockers = ?blockers_short
    );
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/* ----------------------------
Config schema (from TOML `[gate]`)
---------------------------- */

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GateCfg {
    pub pattern: String,
    pub exclude_reshares: bool,
    pub blockers: Vec<BlockerCfg>,
}

impl Default for GateCfg {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_GATE_PATTERN.to_string(),
            exclude_reshares: true,
            blockers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockerCfg {
    pub id: String,
    pub pattern: String,
    pub reason: String,
}

/* ----------------------------
Compiled gate
---------------------------- */

#[derive(Debug)]
struct CompiledBlocker {
    cfg: BlockerCfg,
    re: Regex,
}

/// Outcome of one gate check, with the reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GateVerdict {
    pub relevant: bool,
    pub reshare: bool,
    pub keyword: bool,
    /// "blocker:<id>:<reason>" for every blocker that matched.
    pub blockers: Vec<String>,
}

#[derive(Debug)]
pub struct RelevanceGate {
    pattern: Regex,
    reshare: Option<Regex>,
    blockers: Vec<CompiledBlocker>,
}

impl RelevanceGate {
    pub fn from_cfg(cfg: &GateCfg) -> anyhow::Result<Self> {
        let pattern = Regex::new(&cfg.pattern)
            .map_err(|e| anyhow::anyhow!("gate pattern regex error: {}", e))?;
        let reshare = if cfg.exclude_reshares {
            Some(Regex::new(RESHARE_PATTERN).expect("reshare regex"))
        } else {
            None
        };
        let blockers = cfg
            .blockers
            .iter()
            .cloned()
            .map(|b| {
                let re = Regex::new(&b.pattern)
                    .map_err(|e| anyhow::anyhow!("blocker `{}` regex error: {}", b.id, e))?;
                Ok(CompiledBlocker { cfg: b, re })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            pattern,
            reshare,
            blockers,
        })
    }

    /// Load from a TOML string holding a `[gate]` table (or nothing, for defaults).
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize, Default)]
        struct Root {
            #[serde(default)]
            gate: GateCfg,
        }
        let root: Root = toml::from_str(toml_str)?;
        Self::from_cfg(&root.gate)
    }

    /// Blockers that match `text`, as "blocker:<id>:<reason>".
    pub fn find_blockers(&self, text: &str) -> Vec<String> {
        self.blockers
            .iter()
            .filter(|b| b.re.is_match(text))
            .map(|b| format!("blocker:{}:{}", b.cfg.id, b.cfg.reason))
            .collect()
    }

    pub fn check(&self, text: &str) -> GateVerdict {
        let reshare = self.reshare.as_ref().is_some_and(|re| re.is_match(text));
        let blockers = if reshare {
            Vec::new()
        } else {
            self.find_blockers(text)
        };
        let keyword = self.pattern.is_match(text);
        let verdict = GateVerdict {
            relevant: !reshare && blockers.is_empty() && keyword,
            reshare,
            keyword,
            blockers,
        };
        if !verdict.relevant && verdict.keyword {
            dev_log_gate(text, &verdict);
        }
        verdict
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        self.check(text).relevant
    }
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::from_cfg(&GateCfg::default()).expect("default gate compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reshares_are_excluded() {
        let g = RelevanceGate::default();
        assert!(g.is_relevant("Argo wins Best Motion Picture Drama"));
        let v = g.check("RT @someone: Argo wins Best Motion Picture Drama");
        assert!(v.reshare && v.keyword && !v.relevant);
        assert!(!g.is_relevant("rt Argo wins"));
    }

    #[test]
    fn reshares_allowed_when_disabled() {
        let g = RelevanceGate::from_toml_str("[gate]\nexclude_reshares = false\n").unwrap();
        assert!(g.is_relevant("RT @someone: Argo wins"));
    }

    #[test]
    fn blockers_veto_and_report() {
        let toml = r#"
[gate]
[[gate.blockers]]
id = "prediction"
pattern = "(?i)\\b(should|will|hope)\\s+win"
reason = "prediction, not an outcome"
"#;
        let g = RelevanceGate::from_toml_str(toml).unwrap();
        let v = g.check("Argo should win Best Picture");
        assert!(!v.relevant);
        assert_eq!(v.blockers, vec!["blocker:prediction:prediction, not an outcome"]);
        assert!(g.is_relevant("Argo wins Best Picture"));
    }

    #[test]
    fn keyword_required() {
        let g = RelevanceGate::default();
        assert!(!g.is_relevant("what a lovely dress"));
        assert!(g.is_relevant("Tina Fey hosted the show"));
    }

    #[test]
    fn bad_regex_is_reported() {
        let err = RelevanceGate::from_toml_str("[gate]\npattern = \"(unclosed\"\n")
            .unwrap_err()
            .to_string();
        assert!(err.contains("gate pattern regex error"));
    }

    #[test]
    fn anon_hash_is_short_hex() {
        let h = anon_hash("Argo wins");
        assert_eq!(h.len(), 12);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
