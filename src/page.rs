//! Page
//!
//! One resolved article, as handed to the game loop.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A resolved article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Title that matched in the index (may differ from the query's casing)
    pub title: String,
    /// Canonical source URL
    pub url: String,
    /// Raw article body
    pub content: String,
    /// Outgoing link targets: no `#section` fragments, no duplicates, never empty
    pub links: Vec<String>,
}

impl Page {
    /// Build a page, normalizing `links`.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        links: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            links: normalize_links(links),
        }
    }

    /// Whether `target` is one of this page's outgoing links
    pub fn links_to(&self, target: &str) -> bool {
        self.links.iter().any(|link| link == target)
    }
}

/// Strip `#fragment`s, drop empty targets and duplicates (first occurrence
/// kept, so the order is deterministic).
pub fn normalize_links(links: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter_map(|mut link| {
            if let Some(pos) = link.find('#') {
                link.truncate(pos);
            }
            (!link.is_empty()).then_some(link)
        })
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
