//! Case-Fallback Resolver
//!
//! Wikipedia titles are conventionally capitalized, but link choosers get the
//! casing wrong all the time. Instead of a case-insensitive secondary index,
//! a miss on the exact title is retried with at most four casing variants:
//!
//! ```text
//! exact → Capitalized → Title Case → lower → UPPER
//! ```
//!
//! Variants equal to the query or to an earlier variant are skipped. An exact
//! hit always wins, even when a "more canonical" variant also exists.

use tracing::debug;

use crate::error::{Result, WikiError};
use crate::index::TitleIndex;

/// Outcome of a successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Location string as stored in the index (not yet transformed)
    pub location: String,
    /// Index key that matched; may differ from the query in casing
    pub matched_title: String,
}

/// First character upper-cased, the rest lower-cased.
///
/// Single-character (and empty) titles are upper-cased whole.
pub fn capitalize(title: &str) -> String {
    let mut chars = title.chars();
    match chars.next() {
        None => String::new(),
        Some(first) if chars.as_str().is_empty() => first.to_uppercase().collect(),
        Some(first) => {
            let mut out = String::with_capacity(title.len());
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
    }
}

/// Conventional title casing: a cased character following an uncased one
/// (or the start of the string) is upper-cased, every other cased character
/// is lower-cased. Uncased characters (digits, punctuation, spaces, most CJK)
/// pass through and act as word boundaries, so `"o'neil 2nd"` becomes
/// `"O'Neil 2Nd"`.
pub fn title_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut previous_cased = false;
    for c in title.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased && !previous_cased {
            out.extend(c.to_uppercase());
        } else if cased {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        previous_cased = cased;
    }
    out
}

/// Casing variants to probe after an exact miss, in priority order.
pub fn fallback_candidates(title: &str) -> Vec<String> {
    let variants = [
        capitalize(title),
        title_case(title),
        title.to_lowercase(),
        title.to_uppercase(),
    ];

    let mut candidates: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        if variant != title && !candidates.contains(&variant) {
            candidates.push(variant);
        }
    }
    candidates
}

/// Resolve `title` to its stored location, applying case fallback on a miss.
///
/// Fails with [`WikiError::ArticleNotFound`] for an empty title or when no
/// variant is present.
pub fn resolve_location(index: &TitleIndex, title: &str) -> Result<Resolution> {
    if title.is_empty() {
        return Err(WikiError::ArticleNotFound("empty title".to_string()));
    }

    if let Some(location) = index.get_str(title)? {
        return Ok(Resolution {
            location: location.to_string(),
            matched_title: title.to_string(),
        });
    }

    for candidate in fallback_candidates(title) {
        if let Some(location) = index.get_str(&candidate)? {
            debug!(query = title, matched = %candidate, "Resolved via case fallback");
            return Ok(Resolution {
                location: location.to_string(),
                matched_title: candidate,
            });
        }
    }

    Err(WikiError::ArticleNotFound(title.to_string()))
}
