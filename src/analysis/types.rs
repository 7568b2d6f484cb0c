//! Core types for image analysis.

use crate::error::{Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Writing style for the creative outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreativeStyle {
    /// Clear, accessible description.
    #[default]
    #[serde(rename = "Simple & Descriptive")]
    Simple,
    /// Elevated vocabulary, atmosphere and subtext.
    #[serde(rename = "Complex & Analytical")]
    Complex,
    /// Evocative, verse-like writing.
    #[serde(rename = "Poetic & Abstract")]
    Poetic,
    /// Social media caption with expressive markers.
    #[serde(rename = "Social Media Caption")]
    Caption,
}

impl CreativeStyle {
    /// All styles, in display order.
    pub const ALL: [CreativeStyle; 4] = [Self::Simple, Self::Complex, Self::Poetic, Self::Caption];

    /// Returns the user-facing label, which is also sent to the model.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Simple => "Simple & Descriptive",
            Self::Complex => "Complex & Analytical",
            Self::Poetic => "Poetic & Abstract",
            Self::Caption => "Social Media Caption",
        }
    }

    /// Guidance text forwarded to the model alongside the label.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Simple => "Focus on clarity and accessibility.",
            Self::Complex => {
                "Use sophisticated vocabulary and focus on atmosphere and hidden meanings."
            }
            Self::Poetic => "Create evocative verses.",
            Self::Caption => "Make them engaging for social media with emojis.",
        }
    }
}

impl std::fmt::Display for CreativeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CreativeStyle {
    type Err = ScribeError;

    /// Accepts the full label or a short name (`simple`, `complex`,
    /// `poetic`, `caption`), case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| {
                style.label().to_lowercase() == needle
                    || style.short_name() == needle
            })
            .ok_or_else(|| ScribeError::Config(format!("unknown style: {}", s)))
    }
}

impl CreativeStyle {
    fn short_name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
            Self::Poetic => "poetic",
            Self::Caption => "caption",
        }
    }
}

/// Number of creative outputs to request. Only 3, 5 and 10 are offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum VariationCount {
    /// Three outputs.
    #[default]
    Three,
    /// Five outputs.
    Five,
    /// Ten outputs.
    Ten,
}

impl VariationCount {
    /// All allowed counts, ascending.
    pub const ALL: [VariationCount; 3] = [Self::Three, Self::Five, Self::Ten];

    /// Returns the count as a number.
    pub fn get(&self) -> usize {
        match self {
            Self::Three => 3,
            Self::Five => 5,
            Self::Ten => 10,
        }
    }
}

impl TryFrom<u32> for VariationCount {
    type Error = ScribeError;

    fn try_from(n: u32) -> Result<Self> {
        match n {
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            other => Err(ScribeError::Config(format!(
                "variation count must be 3, 5 or 10 (got {})",
                other
            ))),
        }
    }
}

impl From<VariationCount> for u32 {
    fn from(count: VariationCount) -> Self {
        count.get() as u32
    }
}

impl std::fmt::Display for VariationCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// User-controlled generation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Writing style.
    pub style: CreativeStyle,
    /// Number of creative outputs.
    pub variation_count: VariationCount,
    /// Extra guidance for the model; empty for none.
    pub custom_instruction: String,
}

impl GenerationSettings {
    /// Creates settings with the given style and count and no instruction.
    pub fn new(style: CreativeStyle, variation_count: VariationCount) -> Self {
        Self {
            style,
            variation_count,
            custom_instruction: String::new(),
        }
    }

    /// Sets the custom instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.custom_instruction = instruction.into();
        self
    }
}

/// One generated text variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeOutput {
    /// Short title for the variation.
    pub title: String,
    /// The generated text.
    pub content: String,
}

/// Everything the model produced for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Descriptive tags (5-10 expected).
    pub tags: Vec<String>,
    /// Dominant colors as `#RRGGBB` (5 expected).
    pub colors: Vec<String>,
    /// Objective description of the image.
    pub visual_details: String,
    /// Creative variations, one per requested count.
    pub creative_outputs: Vec<CreativeOutput>,
}

/// What to do when the model returns the wrong number of creative outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountPolicy {
    /// Reject the response.
    #[default]
    Strict,
    /// Truncate surplus outputs with a warning; still reject a shortfall.
    Lenient,
}
