//! Gemini-backed analyzer.

use crate::analysis::prompt::{response_schema, task_prompt, SYSTEM_INSTRUCTION, TEMPERATURE};
use crate::analysis::provider::Analyzer;
use crate::analysis::response::parse_analysis;
use crate::analysis::types::{AnalysisResult, CountPolicy, GenerationSettings};
use crate::error::{Result, ScribeError};
use crate::gemini::{Content, GenerateContentRequest, GeminiClient, GenerationConfig, Part};
use crate::image::EncodedImage;
use async_trait::async_trait;
use std::time::Instant;

/// Analyzes images with Gemini's structured JSON output.
#[derive(Debug, Clone)]
pub struct GeminiAnalyzer {
    client: GeminiClient,
    count_policy: CountPolicy,
}

impl GeminiAnalyzer {
    /// Creates an analyzer on top of a configured client.
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            count_policy: CountPolicy::default(),
        }
    }

    /// Sets how a wrong number of creative outputs is handled.
    pub fn with_count_policy(mut self, policy: CountPolicy) -> Self {
        self.count_policy = policy;
        self
    }

    fn build_request(image: &EncodedImage, settings: &GenerationSettings) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Some(Content::system(SYSTEM_INSTRUCTION)),
            contents: vec![Content::user(vec![
                Part::inline(image.mime_type.clone(), image.data.clone()),
                Part::text(task_prompt(settings)),
            ])],
            generation_config: Some(GenerationConfig {
                temperature: Some(TEMPERATURE),
                response_mime_type: Some("application/json"),
                response_schema: Some(response_schema(settings.variation_count.get())),
            }),
            tools: Vec::new(),
        }
    }
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        image: &EncodedImage,
        settings: &GenerationSettings,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        let body = Self::build_request(image, settings);

        tracing::debug!(
            model = self.client.model().as_str(),
            style = %settings.style,
            count = settings.variation_count.get(),
            has_instruction = !settings.custom_instruction.trim().is_empty(),
            image_bytes = image.len(),
            "requesting analysis"
        );

        let text = match self.client.generate_text(&body).await {
            Ok(Some(text)) => text,
            Ok(None) => return Err(ScribeError::EmptyResponse),
            Err(e @ (ScribeError::Config(_) | ScribeError::Timeout(_))) => return Err(e),
            Err(e @ ScribeError::AnalysisFailed(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Gemini analysis request failed");
                return Err(ScribeError::AnalysisFailed(e.to_string()));
            }
        };

        let result = parse_analysis(&text, settings.variation_count, self.count_policy)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            tags = result.tags.len(),
            outputs = result.creative_outputs.len(),
            "analysis complete"
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}
