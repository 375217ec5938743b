//! Edit buffer for comma-separated list fields
//!
//! A list field is edited as free text and only turned into a list when the
//! form is submitted, so partial input like `"Tax, "` survives while typing.

use serde::{Deserialize, Serialize};

/// Raw text of a list field plus its parsed view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEditBuffer {
    raw: String,
}

impl ListEditBuffer {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Buffer showing an already normalized list
    pub fn from_items<S: AsRef<str>>(items: &[S]) -> Self {
        let joined = items
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        Self { raw: joined }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Replace the raw text, keeping whatever the user typed
    pub fn with_raw(self, raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Normalized list for submission
    pub fn items(&self) -> Vec<String> {
        parse_list(&self.raw)
    }
}

/// Split on commas, trim, drop empties, keep the first occurrence of duplicates
pub fn parse_list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() || items.iter().any(|existing| existing == item) {
            continue;
        }
        items.push(item.to_string());
    }
    items
}
