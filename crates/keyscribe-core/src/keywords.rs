//! Short-tail / long-tail keyword partitioning.
//!
//! The keyphrase model answers with a single comma-separated string. Each
//! trimmed phrase lands in exactly one bucket, chosen by its whitespace token
//! count, and keeps its original relative order.

use serde::{Deserialize, Serialize};

/// Phrases with at most this many words are short-tail.
pub const SHORT_TAIL_MAX_WORDS: usize = 2;

/// Keywords split into short-tail (≤2 words) and long-tail (>2 words) buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub short_tail: Vec<String>,
    pub long_tail: Vec<String>,
}

impl KeywordSet {
    /// Partition a raw comma-separated phrase string.
    ///
    /// Phrases that are empty after trimming are dropped, so an empty model
    /// answer yields an empty set rather than a single blank keyword.
    pub fn from_phrases(raw: &str) -> Self {
        let mut set = Self::default();
        for phrase in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if word_count(phrase) <= SHORT_TAIL_MAX_WORDS {
                set.short_tail.push(phrase.to_string());
            } else {
                set.long_tail.push(phrase.to_string());
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.short_tail.is_empty() && self.long_tail.is_empty()
    }

    pub fn len(&self) -> usize {
        self.short_tail.len() + self.long_tail.len()
    }

    /// Short-tail keywords as a single copyable line.
    pub fn short_tail_text(&self) -> String {
        self.short_tail.join(", ")
    }

    /// Long-tail keywords as a single copyable line.
    pub fn long_tail_text(&self) -> String {
        self.long_tail.join(", ")
    }
}

fn word_count(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}
