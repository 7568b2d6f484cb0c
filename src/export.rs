//! Plain-text export of an analysis.
//!
//! The layout is fixed: a banner with source and URL, then the VISUAL
//! DETAILS, TAGS, COLORS and CREATIVE OUTPUTS sections. [`parse`] reads the
//! same layout back.
//!
//! Model text is escaped so that it cannot forge structure. List entries
//! escape `\`, `,` and newlines with a backslash. In free text, a line that
//! starts with `[` or `\`, or that equals a section title, gets a leading
//! backslash. Titles escape `\` and newlines.

use crate::analysis::{AnalysisResult, CreativeOutput};
use crate::error::{Result, ScribeError};
use std::path::Path;

/// File name offered for downloads.
pub const EXPORT_FILE_NAME: &str = "visionary-scribe-results.txt";

const BANNER: &str = "VISIONARY SCRIBE ANALYSIS";
const DEFAULT_SOURCE: &str = "Uploaded Image";
const DETAILS: &str = "VISUAL DETAILS";
const TAGS: &str = "TAGS";
const COLORS: &str = "COLORS";
const OUTPUTS: &str = "CREATIVE OUTPUTS";

/// An export read back from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedAnalysis {
    /// Provenance label.
    pub source: String,
    /// Image URL.
    pub url: String,
    /// The analysis.
    pub result: AnalysisResult,
}

fn header(title: &str) -> String {
    format!("{}\n{}\n", title, "-".repeat(title.len()))
}

/// Renders the export document.
pub fn render(result: &AnalysisResult, image_url: &str, image_source: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');
    out.push_str(&"=".repeat(BANNER.len()));
    out.push('\n');
    out.push_str(&format!(
        "Source: {}\n",
        image_source.unwrap_or(DEFAULT_SOURCE)
    ));
    out.push_str(&format!("URL: {}\n\n", image_url));

    out.push_str(&header(DETAILS));
    out.push_str(&escape_block(&result.visual_details));
    out.push_str("\n\n");

    out.push_str(&header(TAGS));
    out.push_str(&join_list(&result.tags));
    out.push_str("\n\n");

    out.push_str(&header(COLORS));
    out.push_str(&join_list(&result.colors));
    out.push_str("\n\n");

    out.push_str(&header(OUTPUTS));
    let blocks: Vec<String> = result
        .creative_outputs
        .iter()
        .enumerate()
        .map(|(i, o)| {
            format!(
                "[{}] {}\n{}\n",
                i + 1,
                escape_title(&o.title),
                escape_block(&o.content)
            )
        })
        .collect();
    out.push_str(&blocks.join("\n"));
    out
}

/// Writes the export document to `path`.
pub fn save(
    path: impl AsRef<Path>,
    result: &AnalysisResult,
    image_url: &str,
    image_source: Option<&str>,
) -> Result<()> {
    std::fs::write(path, render(result, image_url, image_source))?;
    Ok(())
}

/// Parses a document produced by [`render`].
pub fn parse(text: &str) -> Result<ExportedAnalysis> {
    let rest = text
        .strip_prefix(BANNER)
        .and_then(|r| r.strip_prefix('\n'))
        .and_then(|r| r.strip_prefix(&"=".repeat(BANNER.len())))
        .and_then(|r| r.strip_prefix('\n'))
        .ok_or_else(|| malformed("missing banner"))?;

    let (source, rest) = take_line(rest, "Source: ")?;
    let (url, rest) = take_line(rest, "URL: ")?;
    let rest = rest.strip_prefix('\n').ok_or_else(|| malformed("missing blank line"))?;

    let rest = rest
        .strip_prefix(&header(DETAILS))
        .ok_or_else(|| malformed("missing VISUAL DETAILS"))?;
    let (visual_details, rest) = split_section(rest, TAGS)?;
    let (tags, rest) = split_section(rest, COLORS)?;
    let (colors, rest) = split_section(rest, OUTPUTS)?;

    Ok(ExportedAnalysis {
        source: source.to_string(),
        url: url.to_string(),
        result: AnalysisResult {
            tags: split_list(tags),
            colors: split_list(colors),
            visual_details: unescape_block(visual_details),
            creative_outputs: parse_outputs(rest)?,
        },
    })
}

fn malformed(what: &str) -> ScribeError {
    ScribeError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("malformed export: {}", what),
    ))
}

fn take_line<'a>(text: &'a str, prefix: &str) -> Result<(&'a str, &'a str)> {
    let (line, rest) = text
        .split_once('\n')
        .ok_or_else(|| malformed("truncated header"))?;
    let value = line
        .strip_prefix(prefix)
        .ok_or_else(|| malformed(prefix.trim()))?;
    Ok((value, rest))
}

/// Splits off the body that precedes `\n\n<next header>`.
fn split_section<'a>(text: &'a str, next: &str) -> Result<(&'a str, &'a str)> {
    let marker = format!("\n\n{}", header(next));
    let at = text
        .find(&marker)
        .ok_or_else(|| malformed(next))?;
    Ok((&text[..at], &text[at + marker.len()..]))
}

fn join_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| {
            let mut out = String::with_capacity(item.len());
            for c in item.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    ',' => out.push_str("\\,"),
                    '\n' => out.push_str("\\n"),
                    c => out.push(c),
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inverse of [`join_list`]: splits on unescaped `", "`.
fn split_list(line: &str) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => current.push('\n'),
                Some(other) => current.push(other),
                None => current.push('\\'),
            },
            ',' if chars.peek() == Some(&' ') => {
                chars.next();
                items.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    items.push(current);
    items
}

fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut chars = title.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn needs_escape(line: &str) -> bool {
    line.starts_with('[')
        || line.starts_with('\\')
        || [BANNER, DETAILS, TAGS, COLORS, OUTPUTS].contains(&line)
}

fn escape_block(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if needs_escape(line) {
                format!("\\{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inverse of [`escape_block`]: drops one leading backslash per line.
fn unescape_block(text: &str) -> String {
    text.split('\n')
        .map(|line| line.strip_prefix('\\').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_outputs(mut text: &str) -> Result<Vec<CreativeOutput>> {
    let mut outputs = Vec::new();
    let mut n = 1;

    while !text.is_empty() {
        let body = text
            .strip_prefix(&format!("[{}] ", n))
            .ok_or_else(|| malformed("creative output marker"))?;
        let (title, body) = body
            .split_once('\n')
            .ok_or_else(|| malformed("creative output title"))?;

        let next_marker = format!("\n\n[{}] ", n + 1);
        let (content, remaining) = match body.find(&next_marker) {
            Some(at) => (&body[..at], &body[at + 2..]),
            None => (body.strip_suffix('\n').unwrap_or(body), ""),
        };

        outputs.push(CreativeOutput {
            title: unescape_title(title),
            content: unescape_block(content),
        });
        text = remaining;
        n += 1;
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            tags: vec!["mountain".into(), "lake".into(), "golden hour".into()],
            colors: vec!["#1E90FF".into(), "#FFD700".into(), "#2F4F4F".into()],
            visual_details: "A calm lake (#1E90FF) below peaks.\nLight is warm (#FFD700).".into(),
            creative_outputs: vec![
                CreativeOutput {
                    title: "Still Water".into(),
                    content: "The lake holds the sky.".into(),
                },
                CreativeOutput {
                    title: "Two Verses".into(),
                    content: "Line one,\nline two.\n\nA second stanza [3] remains.".into(),
                },
                CreativeOutput {
                    title: "Last".into(),
                    content: "Fin.".into(),
                },
            ],
        }
    }

    #[test]
    fn test_render_layout() {
        let text = render(&sample(), "https://img.example/x.jpg", Some("Sample Gallery"));
        assert!(text.starts_with("VISIONARY SCRIBE ANALYSIS\n=========================\n"));
        assert!(text.contains("Source: Sample Gallery\nURL: https://img.example/x.jpg\n"));
        assert!(text.contains("\nVISUAL DETAILS\n--------------\nA calm lake"));
        assert!(text.contains("\nTAGS\n----\nmountain, lake, golden hour\n"));
        assert!(text.contains("\nCOLORS\n------\n#1E90FF, #FFD700, #2F4F4F\n"));
        assert!(text.contains("\nCREATIVE OUTPUTS\n----------------\n[1] Still Water\n"));
        assert!(text.contains("\n[3] Last\nFin.\n"));
    }

    #[test]
    fn test_render_default_source() {
        let text = render(&sample(), "u", None);
        assert!(text.contains("Source: Uploaded Image\n"));
    }

    #[test]
    fn test_round_trip() {
        let result = sample();
        let text = render(&result, "https://img.example/x.jpg", Some("Direct Link"));
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.result, result);
        assert_eq!(parsed.source, "Direct Link");
        assert_eq!(parsed.url, "https://img.example/x.jpg");
    }

    #[test]
    fn test_round_trip_tag_with_comma() {
        let mut result = sample();
        result.tags = vec!["Paris, France".into(), "dusk".into(), "back\\slash,".into()];
        let text = render(&result, "u", None);
        assert!(text.contains("\nParis\\, France, dusk, back\\\\slash\\,\n"));
        assert_eq!(parse(&text).unwrap().result.tags, result.tags);
    }

    #[test]
    fn test_round_trip_content_with_output_marker() {
        let mut result = sample();
        result.creative_outputs = vec![
            CreativeOutput {
                title: "One".into(),
                content: "Intro\n\n[2] a footnote\n\\[escaped already]".into(),
            },
            CreativeOutput {
                title: "Two\nlines".into(),
                content: "second".into(),
            },
        ];
        let parsed = parse(&render(&result, "u", None)).unwrap();
        assert_eq!(parsed.result.creative_outputs, result.creative_outputs);
    }

    #[test]
    fn test_round_trip_details_with_section_title() {
        let mut result = sample();
        result.visual_details = "A sign reads:\n\nTAGS\n----\nin chalk.".into();
        let parsed = parse(&render(&result, "u", None)).unwrap();
        assert_eq!(parsed.result, result);
    }

    #[test]
    fn test_round_trip_empty_lists() {
        let result = AnalysisResult {
            tags: vec![],
            colors: vec![],
            visual_details: String::new(),
            creative_outputs: vec![],
        };
        let parsed = parse(&render(&result, "u", None)).unwrap();
        assert_eq!(parsed.result, result);
    }

    #[test]
    fn test_parse_rejects_foreign_text() {
        assert!(parse("hello").is_err());
        let text = render(&sample(), "u", None).replace("COLORS\n------", "PALETTE\n-------");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        save(&path, &sample(), "u", None).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse(&text).unwrap().result, sample());
    }
}
