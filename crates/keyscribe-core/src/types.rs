//! Core value types produced by a pipeline run.

use crate::keywords::KeywordSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural-language caption from the image-to-text hop.
///
/// Always non-empty: [`Caption::new`] refuses blank text, so holding a
/// `Caption` is enough to start the keyword hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Caption(String);

impl Caption {
    /// Trim and wrap caption text; `None` when nothing is left.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Caption {
    type Error = &'static str;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(&text).ok_or("caption must not be blank")
    }
}

impl From<Caption> for String {
    fn from(caption: Caption) -> Self {
        caption.0
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Successful outcome of both hops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub caption: Caption,
    pub keywords: KeywordSet,
}
