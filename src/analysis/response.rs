//! Parsing and validating the model's analysis JSON.

use crate::analysis::palette::{lint_color_mentions, normalize_hex, ColorWarning};
use crate::analysis::types::{AnalysisResult, CountPolicy, VariationCount};
use crate::error::{Result, ScribeError};

impl AnalysisResult {
    /// Color words in the free text that lack an inline hex code.
    ///
    /// Compliance with the hex-code rule is up to the model, so this is
    /// advisory only.
    pub fn color_warnings(&self) -> Vec<ColorWarning> {
        let mut warnings = lint_color_mentions("visualDetails", &self.visual_details);
        for (i, output) in self.creative_outputs.iter().enumerate() {
            warnings.extend(lint_color_mentions(
                &format!("creativeOutputs[{}]", i),
                &output.content,
            ));
        }
        warnings
    }
}

/// Parses `text` into an [`AnalysisResult`] and enforces the contract:
/// the declared shape, `#RRGGBB` colors and the requested output count.
pub(crate) fn parse_analysis(
    text: &str,
    expected: VariationCount,
    policy: CountPolicy,
) -> Result<AnalysisResult> {
    let mut result: AnalysisResult = serde_json::from_str(strip_json_fence(text))
        .map_err(|e| ScribeError::AnalysisFailed(format!("malformed analysis JSON: {}", e)))?;

    result.colors = result
        .colors
        .iter()
        .map(|raw| {
            normalize_hex(raw).ok_or_else(|| {
                ScribeError::AnalysisFailed(format!("invalid hex color: {:?}", raw))
            })
        })
        .collect::<Result<_>>()?;

    let want = expected.get();
    let got = result.creative_outputs.len();
    if got != want {
        match policy {
            CountPolicy::Lenient if got > want => {
                tracing::warn!(
                    requested = want,
                    received = got,
                    "model returned extra creative outputs; truncating"
                );
                result.creative_outputs.truncate(want);
            }
            _ => {
                return Err(ScribeError::AnalysisFailed(format!(
                    "expected {} creative outputs, got {}",
                    want, got
                )));
            }
        }
    }

    for warning in result.color_warnings() {
        tracing::warn!(%warning, "color mentioned without hex code");
    }

    Ok(result)
}

/// JSON mode should return a bare object, but some models still fence it.
fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(outputs: usize, colors: &str) -> String {
        let outputs: Vec<String> = (0..outputs)
            .map(|i| format!(r#"{{"title": "T{i}", "content": "A teal (#008080) tide {i}."}}"#))
            .collect();
        format!(
            r#"{{
                "tags": ["sea", "dusk", "calm", "waves", "horizon"],
                "colors": [{colors}],
                "visualDetails": "A teal (#008080) sea under a pink (#FFC0CB) sky.",
                "creativeOutputs": [{}]
            }}"#,
            outputs.join(",")
        )
    }

    const FIVE_COLORS: &str = r##""#008080", "#FFC0CB", "#000000", "#FFFFFF", "#123456""##;

    #[test]
    fn test_parse_valid_response() {
        let result =
            parse_analysis(&payload(5, FIVE_COLORS), VariationCount::Five, CountPolicy::Strict)
                .unwrap();
        assert_eq!(result.creative_outputs.len(), 5);
        assert_eq!(result.colors.len(), 5);
        assert_eq!(result.tags[0], "sea");
        assert!(result.color_warnings().is_empty());
    }

    #[test]
    fn test_parse_normalizes_colors() {
        let result = parse_analysis(
            &payload(3, r##""008080", "#fff""##),
            VariationCount::Three,
            CountPolicy::Strict,
        )
        .unwrap();
        assert_eq!(result.colors, vec!["#008080", "#FFFFFF"]);
    }

    #[test]
    fn test_parse_rejects_non_hex_colors() {
        let err = parse_analysis(
            &payload(3, r#""teal""#),
            VariationCount::Three,
            CountPolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, ScribeError::AnalysisFailed(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        for text in ["not json", "{\"tags\": []}", "[]"] {
            let err = parse_analysis(text, VariationCount::Three, CountPolicy::Strict)
                .unwrap_err();
            assert!(matches!(err, ScribeError::AnalysisFailed(_)), "{text}");
        }
    }

    #[test]
    fn test_strict_count_mismatch_fails() {
        for n in [2, 4] {
            let err = parse_analysis(
                &payload(n, FIVE_COLORS),
                VariationCount::Three,
                CountPolicy::Strict,
            )
            .unwrap_err();
            assert!(
                matches!(err, ScribeError::AnalysisFailed(ref m) if m.contains("expected 3")),
                "{err:?}"
            );
        }
    }

    #[test]
    fn test_lenient_count_truncates_surplus() {
        let result = parse_analysis(
            &payload(12, FIVE_COLORS),
            VariationCount::Ten,
            CountPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(result.creative_outputs.len(), 10);
        assert_eq!(result.creative_outputs[9].title, "T9");
    }

    #[test]
    fn test_lenient_count_still_rejects_shortfall() {
        assert!(parse_analysis(
            &payload(4, FIVE_COLORS),
            VariationCount::Five,
            CountPolicy::Lenient
        )
        .is_err());
    }

    #[test]
    fn test_parse_accepts_fenced_json() {
        let fenced = format!("```json\n{}\n```", payload(3, FIVE_COLORS));
        assert!(parse_analysis(&fenced, VariationCount::Three, CountPolicy::Strict).is_ok());
    }

    #[test]
    fn test_color_warnings_cover_outputs() {
        let mut result =
            parse_analysis(&payload(3, FIVE_COLORS), VariationCount::Three, CountPolicy::Strict)
                .unwrap();
        result.creative_outputs[1].content = "Under a silver moon.".into();
        let warnings = result.color_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "creativeOutputs[1]");
        assert_eq!(warnings[0].word, "silver");
    }
}
