#![warn(missing_docs)]
//! Visionary Scribe - turn images into tags, palettes and creative writing.
//!
//! An image is sourced from a URL (pasted, picked from a sample gallery, or
//! found through AI-assisted search), fetched and encoded, then sent to
//! Gemini for a structured analysis: tags, hex colors, a description, and a
//! chosen number of creative texts in a chosen style.
//!
//! # Quick Start
//!
//! ```no_run
//! use visionary_scribe::{
//!     ConfigChange, CreativeStyle, GeminiAnalyzer, GeminiClient, SessionMachine, VariationCount,
//! };
//!
//! #[tokio::main]
//! async fn main() -> visionary_scribe::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let session = SessionMachine::builder()
//!         .analyzer(GeminiAnalyzer::new(client))
//!         .build()?;
//!
//!     let url = visionary_scribe::samples::SAMPLE_IMAGES[0];
//!     let _ = session.submit_image(url, visionary_scribe::samples::SAMPLE_GALLERY).await;
//!     let _ = session.update_config(ConfigChange::Style(CreativeStyle::Poetic));
//!     let _ = session.update_config(ConfigChange::Count(VariationCount::Five));
//!     let _ = session.generate().await;
//!
//!     if let Some(text) = session.export() {
//!         println!("{}", text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `visionary-scribe` command-line binary

mod error;
#[cfg(test)]
mod test_util;

pub mod analysis;
pub mod export;
pub mod gemini;
pub mod image;
pub mod samples;
pub mod search;
pub mod session;
pub mod url_policy;

// Re-export error types at crate root
pub use error::{Result, ScribeError};

pub use analysis::{
    AnalysisResult, Analyzer, ColorWarning, CountPolicy, CreativeOutput, CreativeStyle,
    GeminiAnalyzer, GenerationSettings, VariationCount,
};
pub use gemini::{GeminiClient, GeminiClientBuilder, GeminiModel};
pub use image::{EncodedImage, HttpImageFetcher, HttpImageFetcherBuilder, ImageFetcher, ImageFormat};
pub use search::{GeminiSearcher, ImageSearcher, SearchResult};
pub use session::{ConfigChange, Phase, Session, SessionMachine, SessionMachineBuilder, Transition};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::analysis::{Analyzer, CreativeStyle, GenerationSettings, VariationCount};
    pub use crate::error::{Result, ScribeError};
    pub use crate::image::ImageFetcher;
    pub use crate::search::ImageSearcher;
    pub use crate::session::{ConfigChange, Phase, SessionMachine, Transition};
}
