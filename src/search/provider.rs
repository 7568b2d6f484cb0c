//! Image searcher trait.

use crate::error::Result;
use crate::search::types::SearchResult;
use async_trait::async_trait;

/// Finds candidate images for a text query.
#[async_trait]
pub trait ImageSearcher: Send + Sync {
    /// Returns up to eight results, none of them on the blocked list.
    ///
    /// An empty list is a valid answer, not an error.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}
