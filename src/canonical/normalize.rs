// src/canonical/normalize.rs
//! Comparison key for category and entity phrases.
//!
//! The key is only ever used for matching; it is never shown as a canonical form.
//! Steps, in order:
//! 1) lowercase + strip diacritics (NFKD, drop combining marks)
//! 2) drop quote variants, unify dash variants to a spaced `-`
//! 3) `&` → `and`, other punctuation → space
//! 4) drop leading articles (`the`, `a`, `an`)
//! 5) token synonyms (`tv` → `television`)
//! 6) collapse whitespace
//!
//! `normalize(normalize(s)) == normalize(s)` holds for every input.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const LEADING_ARTICLES: [&str; 3] = ["the", "a", "an"];

const SYNONYMS: [(&str, &str); 2] = [("tv", "television"), ("&", "and")];

/// Dash-like code points folded to a plain hyphen.
pub(crate) fn is_dash(ch: char) -> bool {
    matches!(
        ch,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}'
    )
}

fn is_quote(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '`' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{00AB}' | '\u{00BB}'
    )
}

/// Lowercase and strip combining marks until stable.
/// A single pass is not enough for a few code points (e.g. `İ` lowercases into `i` + U+0307).
fn fold_case_and_marks(input: &str) -> String {
    let mut cur = input.to_string();
    for _ in 0..4 {
        let next: String = cur
            .to_lowercase()
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect();
        if next == cur {
            break;
        }
        cur = next;
    }
    cur
}

/// Normalize a phrase into its comparison key.
pub fn normalize(input: &str) -> String {
    let folded = fold_case_and_marks(input);

    let mut spaced = String::with_capacity(folded.len() + 8);
    for ch in folded.chars() {
        if is_quote(ch) {
            continue;
        }
        if is_dash(ch) {
            spaced.push_str(" - ");
        } else if ch == '&' {
            spaced.push_str(" & ");
        } else if ch.is_alphanumeric() || ch.is_whitespace() {
            spaced.push(ch);
        } else {
            spaced.push(' ');
        }
    }

    let mut tokens: Vec<&str> = spaced.split_whitespace().collect();
    while let Some(first) = tokens.first() {
        if LEADING_ARTICLES.contains(first) {
            tokens.remove(0);
        } else {
            break;
        }
    }

    tokens
        .into_iter()
        .map(|t| {
            SYNONYMS
                .iter()
                .find(|(from, _)| *from == t)
                .map(|(_, to)| *to)
                .unwrap_or(t)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word tokens of a phrase (punctuation and dashes dropped), used by the similarity measures.
pub fn tokens(input: &str) -> Vec<String> {
    normalize(input)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Human-readable dashes for display: any dash run becomes ` – ` with single spaces.
pub fn readable_dashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut in_dash = false;
    for ch in input.chars() {
        if is_dash(ch) {
            if !in_dash {
                out.push_str(" \u{2013} ");
                in_dash = true;
            }
        } else {
            out.push(ch);
            in_dash = false;
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
