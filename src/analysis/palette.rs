//! Hex color validation and the inline hex-code lint.

use regex::Regex;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap()
});

static COLOR_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(red|orange|yellow|green|blue|purple|violet|pink|brown|black|white|gr[ae]y|gold|golden|silver|teal|turquoise|cyan|magenta|indigo|azure|crimson|scarlet|amber|beige|ivory|navy|maroon|olive|emerald|ochre|lavender|coral|cream|bronze|copper)\b",
    )
    .unwrap()
});

static INLINE_HEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*#[0-9A-Fa-f]{6}\s*\)").unwrap()
});

/// How far past a color word the hex code may appear ("rustic red brick (#B22222)").
const LOOKAHEAD_CHARS: usize = 40;

/// Returns true if `s` is a `#RRGGBB` color.
pub fn is_hex_color(s: &str) -> bool {
    HEX_COLOR.is_match(s)
}

/// Normalises a model-supplied color to `#RRGGBB`.
///
/// Accepts a missing `#` and the 3-digit shorthand; anything else is `None`.
pub fn normalize_hex(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded = match digits.len() {
        6 => digits.to_string(),
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        _ => return None,
    };
    Some(format!("#{}", expanded.to_ascii_uppercase()))
}

/// A color word mentioned without its hex code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorWarning {
    /// Where the mention was found, e.g. `visualDetails` or `creativeOutputs[2]`.
    pub field: String,
    /// The color word as written.
    pub word: String,
    /// Byte offset of the word within the field.
    pub offset: usize,
}

impl std::fmt::Display for ColorWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: '{}' at {} has no hex code",
            self.field, self.word, self.offset
        )
    }
}

/// Finds color words in `text` that are not followed by `(#RRGGBB)` within
/// the same clause.
pub fn lint_color_mentions(field: &str, text: &str) -> Vec<ColorWarning> {
    COLOR_WORD
        .find_iter(text)
        .filter(|m| {
            let rest = &text[m.end()..];
            let clause_end = rest
                .char_indices()
                .take(LOOKAHEAD_CHARS)
                .find(|(_, c)| matches!(c, '.' | ';' | '!' | '?' | '\n'))
                .map(|(i, _)| i)
                .unwrap_or_else(|| {
                    rest.char_indices()
                        .nth(LOOKAHEAD_CHARS)
                        .map_or(rest.len(), |(i, _)| i)
                });
            !INLINE_HEX.is_match(&rest[..clause_end])
        })
        .map(|m| ColorWarning {
            field: field.to_string(),
            word: m.as_str().to_string(),
            offset: m.start(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#007FFF"));
        assert!(is_hex_color("#ffd700"));
        assert!(!is_hex_color("007FFF"));
        assert!(!is_hex_color("#FFF"));
        assert!(!is_hex_color("#GGGGGG"));
        assert!(!is_hex_color("#007FFF "));
    }

    #[test]
    fn test_normalize_hex() {
        assert_eq!(normalize_hex("#007fff").as_deref(), Some("#007FFF"));
        assert_eq!(normalize_hex(" 007FFF ").as_deref(), Some("#007FFF"));
        assert_eq!(normalize_hex("#abc").as_deref(), Some("#AABBCC"));
        assert_eq!(normalize_hex("blue"), None);
        assert_eq!(normalize_hex("#12345"), None);
        assert_eq!(normalize_hex("rgb(0,0,0)"), None);
    }

    #[test]
    fn test_lint_accepts_compliant_text() {
        let text = "The bright azure (#007FFF) sky contrasts with the golden (#FFD700) wheat fields.";
        assert!(lint_color_mentions("visualDetails", text).is_empty());
    }

    #[test]
    fn test_lint_allows_hex_after_noun() {
        let text = "A rustic red brick (#B22222) wall.";
        assert!(lint_color_mentions("visualDetails", text).is_empty());
    }

    #[test]
    fn test_lint_flags_missing_codes() {
        let text = "A blue sky. Some green (#00FF00) grass.";
        let warnings = lint_color_mentions("creativeOutputs[0]", text);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].word, "blue");
        assert_eq!(warnings[0].field, "creativeOutputs[0]");
        assert_eq!(warnings[0].offset, 2);
    }

    #[test]
    fn test_lint_does_not_cross_sentences() {
        let text = "It is white. (#FFFFFF) follows later.";
        assert_eq!(lint_color_mentions("f", text).len(), 1);
    }

    #[test]
    fn test_lint_ignores_words_containing_colors() {
        let text = "The redwood forest and a bluebird.";
        assert!(lint_color_mentions("f", text).is_empty());
    }
}
