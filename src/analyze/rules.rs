// src/analyze/rules.rs
//! Anchor rules: priority-ordered binary split patterns.
//!
//! Each rule is a regex with exactly three capture groups: left span, link phrase, right
//! span. The rule declares which side holds the category phrase (`layout`) and what the
//! other side names (`relation`). Built-in table, in priority order:
//!
//! | id             | link                                               | layout         | relation  |
//! |----------------|----------------------------------------------------|----------------|-----------|
//! | `goes_to`      | goes to, awarded to                                | category_left  | winner    |
//! | `wins`         | wins, win, won, receives, gets, takes home, is awarded | category_right | winner |
//! | `presented_by` | presented by                                       | category_left  | presenter |
//! | `presents`     | presents, presenting, present, to present          | category_right | presenter |
//!
//! A table can also come from `[[extractor.anchors]]` in the pipeline TOML.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Category phrase on the left of the link, entity on the right.
    CategoryLeft,
    /// Entity on the left of the link, category phrase on the right.
    CategoryRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Winner,
    Presenter,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnchorCfg {
    pub id: String,
    pub pattern: String,
    pub layout: Layout,
    pub relation: Relation,
}

impl AnchorCfg {
    fn new(id: &str, pattern: &str, layout: Layout, relation: Relation) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            layout,
            relation,
        }
    }
}

pub fn default_anchor_cfgs() -> Vec<AnchorCfg> {
    vec![
        AnchorCfg::new(
            "goes_to",
            r"(?is)(.+?)\s+(goes\s+to|awarded\s+to)\s+(.+)",
            Layout::CategoryLeft,
            Relation::Winner,
        ),
        AnchorCfg::new(
            "wins",
            r"(?is)(.+?)\s+(wins?|won|receives?|gets|takes\s+home|is\s+awarded)\s+(.+)",
            Layout::CategoryRight,
            Relation::Winner,
        ),
        AnchorCfg::new(
            "presented_by",
            r"(?is)(.+?)\s+(presented\s+by)\s+(.+)",
            Layout::CategoryLeft,
            Relation::Presenter,
        ),
        AnchorCfg::new(
            "presents",
            r"(?is)(.+?)\s+(presents|presenting|to\s+present|present)\s+(.+)",
            Layout::CategoryRight,
            Relation::Presenter,
        ),
    ]
}

/// Text split around a link phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    pub left: &'a str,
    pub link: &'a str,
    pub right: &'a str,
}

#[derive(Debug)]
pub struct AnchorRule {
    pub id: String,
    pub layout: Layout,
    pub relation: Relation,
    re: Regex,
}

impl AnchorRule {
    pub fn compile(cfg: &AnchorCfg) -> Result<Self> {
        let re = Regex::new(&cfg.pattern)
            .map_err(|e| anyhow!("anchor `{}` regex error: {}", cfg.id, e))?;
        // captures_len counts the implicit whole-match group
        if re.captures_len() != 4 {
            return Err(anyhow!(
                "anchor `{}` must have exactly 3 capture groups (left, link, right), found {}",
                cfg.id,
                re.captures_len() - 1
            ));
        }
        Ok(Self {
            id: cfg.id.clone(),
            layout: cfg.layout,
            relation: cfg.relation,
            re,
        })
    }

    pub fn split<'a>(&self, text: &'a str) -> Option<Split<'a>> {
        let caps = self.re.captures(text)?;
        let left = caps.get(1)?.as_str().trim();
        let link = caps.get(2)?.as_str();
        let right = caps.get(3)?.as_str().trim();
        if left.is_empty() || right.is_empty() {
            return None;
        }
        Some(Split { left, link, right })
    }

    /// (category side, entity side) for this rule's layout.
    pub fn sides<'a>(&self, split: &Split<'a>) -> (&'a str, &'a str) {
        match self.layout {
            Layout::CategoryLeft => (split.left, split.right),
            Layout::CategoryRight => (split.right, split.left),
        }
    }
}

#[derive(Debug)]
pub struct AnchorTable {
    rules: Vec<AnchorRule>,
}

static BUILTIN: Lazy<Vec<AnchorCfg>> = Lazy::new(default_anchor_cfgs);

impl AnchorTable {
    pub fn from_cfgs(cfgs: &[AnchorCfg]) -> Result<Self> {
        let rules = cfgs
            .iter()
            .map(AnchorRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Built-in table; empty config lists fall back to this.
    pub fn builtin() -> Self {
        Self::from_cfgs(&BUILTIN).expect("built-in anchors compile")
    }

    pub fn rules(&self) -> &[AnchorRule] {
        &self.rules
    }
}

impl Default for AnchorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> AnchorRule {
        let cfgs = default_anchor_cfgs();
        let cfg = cfgs.iter().find(|c| c.id == id).unwrap();
        AnchorRule::compile(cfg).unwrap()
    }

    #[test]
    fn goes_to_splits_category_left() {
        let r = rule("goes_to");
        let s = r.split("Best Director goes to Ben Affleck for Argo").unwrap();
        assert_eq!(s.left, "Best Director");
        assert_eq!(s.link, "goes to");
        assert_eq!(s.right, "Ben Affleck for Argo");
        assert_eq!(r.sides(&s), ("Best Director", "Ben Affleck for Argo"));
    }

    #[test]
    fn wins_takes_first_link() {
        let r = rule("wins");
        let s = r.split("Argo WINS Best Motion Picture Drama").unwrap();
        assert_eq!(s.left, "Argo");
        assert_eq!(s.link, "WINS");
        assert_eq!(r.sides(&s).0, "Best Motion Picture Drama");
        assert!(r.split("winning is everything").is_none());
    }

    #[test]
    fn presents_prefers_to_present() {
        let r = rule("presents");
        let s = r.split("Will Ferrell and Kristen Wiig to present Best Actress").unwrap();
        assert_eq!(s.left, "Will Ferrell and Kristen Wiig");
        assert_eq!(s.link, "to present");
        assert!(r.split("Best Actor presented by Halle Berry").is_none());
    }

    #[test]
    fn capture_count_is_validated() {
        let bad = AnchorCfg::new("bad", r"(.+) wins (.+)", Layout::CategoryRight, Relation::Winner);
        let err = AnchorRule::compile(&bad).unwrap_err().to_string();
        assert!(err.contains("anchor `bad`"));

        let broken = AnchorCfg::new("broken", r"(.+", Layout::CategoryRight, Relation::Winner);
        assert!(AnchorRule::compile(&broken).is_err());
    }

    #[test]
    fn builtin_order() {
        let ids: Vec<_> = AnchorTable::builtin().rules().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["goes_to", "wins", "presented_by", "presents"]);
    }
}
