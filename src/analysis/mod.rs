//! Image analysis: prompt, schema, response contract and providers.

mod gemini;
pub mod palette;
pub mod prompt;
mod provider;
mod response;
mod types;

pub use gemini::GeminiAnalyzer;
pub use palette::ColorWarning;
pub use provider::Analyzer;
pub use types::{
    AnalysisResult, CountPolicy, CreativeOutput, CreativeStyle, GenerationSettings,
    VariationCount,
};
