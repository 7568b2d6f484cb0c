//! Prompt text and response schema for image analysis.

use crate::analysis::types::GenerationSettings;
use serde_json::{json, Value};

/// System role for every analysis request.
pub const SYSTEM_INSTRUCTION: &str = "You are a highly perceptive and creative visual analyst. \
Your goal is to analyze images deeply and generate creative text based on them.\n\
You must be precise in identifying visual elements and versatile in writing styles ranging \
from simple descriptions to abstract poetry.";

/// Output policy sent with every request, unchanged.
pub const HEX_CODE_RULE: &str = "[CRITICAL FORMATTING RULE - HEX CODES]
You MUST identify the specific colors in the image.
Whenever you mention a color in the 'visualDetails' or 'creativeOutputs' text (e.g., 'blue sky', 'rustic red brick'), you MUST immediately append the approximate Hex Code for that color in parentheses.

Example format:
\"The bright azure (#007FFF) sky contrasts with the golden (#FFD700) wheat fields.\"

This rule is mandatory for ALL text generated.";

/// Sampling temperature for analysis.
pub const TEMPERATURE: f32 = 0.7;

/// Builds the task prompt for one analysis.
pub fn task_prompt(settings: &GenerationSettings) -> String {
    let count = settings.variation_count.get();
    let style = settings.style;

    let mut prompt = format!(
        "Analyze the attached image.\n\
         \n\
         1. Extract a list of 5-10 relevant tags.\n\
         2. Extract the main color palette as 5 hex codes.\n\
         3. Write a detailed objective visual description.\n\
         4. Generate exactly {count} distinct creative text outputs in the style of: \"{label}\".\n   \
            - {guidance}\n",
        count = count,
        label = style.label(),
        guidance = style.guidance(),
    );

    let instruction = settings.custom_instruction.trim();
    if !instruction.is_empty() {
        prompt.push_str(&format!(
            "\n[USER CUSTOM INSTRUCTION]\n\
             The user has provided specific guidance for this analysis: \"{}\"\n\
             Please integrate this instruction intelligently into the creative outputs and description style.\n",
            instruction
        ));
    }

    prompt.push('\n');
    prompt.push_str(HEX_CODE_RULE);
    prompt
}

/// Declared response shape, in Gemini's OpenAPI schema dialect.
pub fn response_schema(count: usize) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "tags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "5-10 descriptive tags related to the image content, mood, and lighting."
            },
            "colors": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "5 dominant hex color codes from the image."
            },
            "visualDetails": {
                "type": "STRING",
                "description": "A concise but detailed paragraph (approx 50-80 words) objectively describing the visual components, composition, and lighting. MUST include hex codes for colors mentioned."
            },
            "creativeOutputs": {
                "type": "ARRAY",
                "description": "A list of creative text variations based on the requested style.",
                "minItems": count,
                "maxItems": count,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": "A short, catchy title for this specific variation."
                        },
                        "content": {
                            "type": "STRING",
                            "description": "The generated creative text content. MUST include hex codes for colors mentioned."
                        }
                    },
                    "required": ["title", "content"]
                }
            }
        },
        "required": ["tags", "colors", "visualDetails", "creativeOutputs"]
    })
}
