//! Core types for image search.

use serde::{Deserialize, Serialize};

/// Most results surfaced per search.
pub const MAX_RESULTS: usize = 8;

/// One candidate image found by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Image (or image page) URL; never on the blocked list.
    pub url: String,
    /// Short title.
    pub title: String,
    /// Root domain the image comes from.
    pub source: String,
}
