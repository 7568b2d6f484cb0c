//! AI-assisted image search.

mod extract;
mod gemini;
mod provider;
mod types;

pub use gemini::GeminiSearcher;
pub use provider::ImageSearcher;
pub use types::{SearchResult, MAX_RESULTS};
