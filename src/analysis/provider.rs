//! Analyzer trait.

use crate::analysis::types::{AnalysisResult, GenerationSettings};
use crate::error::Result;
use crate::image::EncodedImage;
use async_trait::async_trait;

/// Produces tags, palette, description and creative outputs for an image.
///
/// Implementations fail with `Config`, `EmptyResponse` or `AnalysisFailed`;
/// `Timeout` is passed through unchanged.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyzes `image` under `settings`.
    ///
    /// On success `creative_outputs.len()` equals the requested count.
    async fn analyze(
        &self,
        image: &EncodedImage,
        settings: &GenerationSettings,
    ) -> Result<AnalysisResult>;

    /// Returns the name of this analyzer for display.
    fn name(&self) -> &str;
}
