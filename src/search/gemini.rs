//! Gemini search-grounded image search.

use crate::error::{Result, ScribeError};
use crate::gemini::{Content, GenerateContentRequest, GeminiClient, Part, Tool};
use crate::search::extract::parse_search_response;
use crate::search::provider::ImageSearcher;
use crate::search::types::SearchResult;
use crate::url_policy::BLOCKED_DOMAINS;
use async_trait::async_trait;

/// Searches the web for images through Gemini's `google_search` tool.
#[derive(Debug, Clone)]
pub struct GeminiSearcher {
    client: GeminiClient,
}

impl GeminiSearcher {
    /// Creates a searcher on top of a configured client.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn build_request(query: &str) -> GenerateContentRequest {
        // responseMimeType cannot be combined with the search tool
        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::user(vec![Part::text(search_prompt(query))])],
            generation_config: None,
            tools: vec![Tool::google_search()],
        }
    }
}

/// Builds the search prompt, with the blocked list enumerated inline.
pub(crate) fn search_prompt(query: &str) -> String {
    format!(
        "Perform a Google Search to find 5-8 high-quality, publicly accessible image URLs matching the query: \"{query}\".\n\
         \n\
         [CRITICAL FILTERING RULES]\n\
         1. EXCLUDE all results from these blocked domains: {blocked}.\n\
         2. Prefer images from Wikipedia, Wikimedia Commons, Public Domain sites, or open educational resources.\n\
         3. Ensure the URLs are direct image links (ending in .jpg, .png, .webp) if possible, or high-quality source pages.\n\
         \n\
         Return the result as a strictly formatted JSON object with this schema:\n\
         {{\n  \"images\": [\n    {{ \"url\": \"string (the image url)\", \"title\": \"string (a short title)\", \"source\": \"string (the root domain source)\" }}\n  ]\n}}\n",
        query = query.trim(),
        blocked = BLOCKED_DOMAINS.join(", "),
    )
}

#[async_trait]
impl ImageSearcher for GeminiSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(query, model = self.client.model().as_str(), "searching images");

        let text = match self.client.generate_text(&Self::build_request(query)).await {
            Ok(text) => text.unwrap_or_default(),
            Err(e @ (ScribeError::Config(_) | ScribeError::Timeout(_))) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Gemini search request failed");
                return Err(ScribeError::SearchFailed(e.to_string()));
            }
        };

        let results = parse_search_response(&text)?;
        tracing::info!(query, results = results.len(), "image search complete");
        Ok(results)
    }
}
