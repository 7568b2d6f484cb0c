//! Pulling search results out of free-form model text.
//!
//! Search grounding cannot be combined with JSON mode, so the reply is prose
//! that usually, but not always, contains the requested object.

use crate::error::{Result, ScribeError};
use crate::search::types::{SearchResult, MAX_RESULTS};
use crate::url_policy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").unwrap());

#[derive(Debug, Deserialize)]
struct SearchPayload {
    /// Anything other than an array counts as no results.
    #[serde(default)]
    images: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    source: String,
}

/// Returns the JSON object to parse: the body of a ```` ```json ```` fence,
/// else of any fence, else the first balanced `{...}` in the text.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let fenced = JSON_FENCE
        .captures(text)
        .or_else(|| ANY_FENCE.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str());

    match fenced {
        Some(body) => first_object(body).or(Some(body)),
        None => first_object(text),
    }
}

/// Finds the first balanced JSON object, ignoring braces inside strings.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses the model reply and applies the authoritative URL filter.
///
/// Blank replies yield no results. Text without a parseable object is a
/// `SearchFailed`.
pub(crate) fn parse_search_response(text: &str) -> Result<Vec<SearchResult>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let json = extract_json(text)
        .ok_or_else(|| ScribeError::SearchFailed("no JSON object in search response".into()))?;
    let payload: SearchPayload = serde_json::from_str(json)
        .map_err(|e| ScribeError::SearchFailed(format!("malformed search JSON: {}", e)))?;

    let images = match payload.images {
        Some(serde_json::Value::Array(images)) => images,
        _ => Vec::new(),
    };
    let raw: Vec<RawResult> = images
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    Ok(filter_results(raw))
}

fn filter_results(raw: Vec<RawResult>) -> Vec<SearchResult> {
    let total = raw.len();
    let mut seen = HashSet::new();

    let results: Vec<SearchResult> = raw
        .into_iter()
        .filter_map(|r| {
            let url = match url_policy::check(&r.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => url,
                Ok(_) => return None,
                Err(e) => {
                    tracing::debug!(url = %r.url, error = %e, "dropping search result");
                    return None;
                }
            };
            if !seen.insert(url.as_str().to_string()) {
                return None;
            }
            let source = if r.source.trim().is_empty() {
                url.host_str()
                    .map(|h| h.trim_start_matches("www.").to_string())
                    .unwrap_or_default()
            } else {
                r.source.trim().to_string()
            };
            Some(SearchResult {
                url: r.url.trim().to_string(),
                title: r.title.trim().to_string(),
                source,
            })
        })
        .take(MAX_RESULTS)
        .collect();

    if results.len() < total {
        tracing::debug!(kept = results.len(), total, "filtered search results");
    }
    results
}
