// src/analyze/hosts.rs
//! Host mentions: "hosted by …", "hosts are …", "your hosts …".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::analyze::extract::{distinct_names, Extractor};
use crate::analyze::ner::EntityKind;

static HOSTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\b(?:hosted\s+by|hosts\s+are|your\s+hosts(?:\s+are)?)\b\s*[:,\-]?\s*(.+)$")
        .expect("hosts regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostMention {
    pub name: String,
    pub source_message_id: String,
}

impl Extractor {
    /// Every distinct PERSON named after a host phrase, up to `max_hosts_per_message`.
    pub fn extract_hosts(&self, message_id: &str, text: &str) -> Vec<HostMention> {
        let Some(tail) = HOSTS.captures(text).and_then(|c| c.get(1)) else {
            return Vec::new();
        };
        let people: Vec<_> = self
            .recognizer()
            .typed_entities(tail.as_str())
            .into_iter()
            .filter(|m| m.kind == EntityKind::Person)
            .collect();

        distinct_names(&people, self.params().max_hosts_per_message)
            .into_iter()
            .map(|name| HostMention {
                name,
                source_message_id: message_id.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::analyze::extract::{Extractor, ExtractorParams};
    use crate::analyze::ner::CapitalizedSpanRecognizer;
    use crate::analyze::rules::AnchorTable;
    use std::sync::Arc;

    fn ex(max: usize) -> Extractor {
        Extractor::new(
            AnchorTable::builtin(),
            Arc::new(CapitalizedSpanRecognizer::default()),
            ExtractorParams {
                max_hosts_per_message: max,
                ..ExtractorParams::default()
            },
        )
    }

    #[test]
    fn hosts_after_phrase() {
        let got = ex(4).extract_hosts("h1", "Golden Globes hosted by Tina Fey & Amy Poehler tonight");
        let names: Vec<_> = got.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Tina Fey", "Amy Poehler"]);
        assert!(got.iter().all(|h| h.source_message_id == "h1"));
    }

    #[test]
    fn cap_and_no_phrase() {
        assert_eq!(ex(1).extract_hosts("h2", "Your hosts: Tina Fey, Amy Poehler").len(), 1);
        assert!(ex(4).extract_hosts("h3", "Tina Fey is hilarious").is_empty());
    }
}
