// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::Serialize;

const BOLD_MARKER: &str = "**";
const ITALIC_MARKER: char = '*';
const CONFIDENCE_PHRASE: &str = "confidence level: ";

/// Confidence the model attaches to a differential, e.g.
/// `*Confidence Level: Medium*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    const ALL: [ConfidenceLevel; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Emphasis rank used by renderers: High 3, Medium 2, Low 1.
    pub fn severity(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A styled run within one line.  Spans never nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineSpan {
    Text { value: String },
    Bold { value: String },
    Italic { value: String },
    /// An italic run carrying a confidence phrase.  `pre`/`post` are the
    /// italic text around the phrase; `label` is the level word as typed.
    ConfidenceAnnotation {
        pre: String,
        level: ConfidenceLevel,
        label: String,
        post: String,
    },
}

impl InlineSpan {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text { value: value.into() }
    }

    pub fn bold(value: impl Into<String>) -> Self {
        Self::Bold { value: value.into() }
    }

    pub fn italic(value: impl Into<String>) -> Self {
        Self::Italic { value: value.into() }
    }
}

/// Split one line into inline spans, left to right.
///
/// At every `*` a `**…**` run is tried first, then a `*…*` run; both take the
/// shortest closing marker and never cross a newline.  Unmatched markers stay
/// literal text.  A run with nothing between its markers (`**`, `****`) is an
/// empty `Bold`.
pub fn format_inline(line: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while let Some(offset) = line[pos..].find(ITALIC_MARKER) {
        let start = pos + offset;
        match match_run(line, start) {
            Some((span, end)) => {
                if start > plain_start {
                    spans.push(InlineSpan::text(&line[plain_start..start]));
                }
                spans.push(span);
                pos = end;
                plain_start = end;
            }
            None => pos = start + ITALIC_MARKER.len_utf8(),
        }
    }

    if plain_start < line.len() {
        spans.push(InlineSpan::text(&line[plain_start..]));
    }
    spans
}

/// Try to match an emphasis run at byte `start` (which holds a `*`).
/// Returns the span and the byte offset just past the run.
fn match_run(line: &str, start: usize) -> Option<(InlineSpan, usize)> {
    let rest = &line[start..];
    let rest = &rest[..rest.find('\n').unwrap_or(rest.len())];

    if let Some(body) = rest.strip_prefix(BOLD_MARKER) {
        if let Some(close) = body.find(BOLD_MARKER) {
            let end = start + 2 * BOLD_MARKER.len() + close;
            return Some((InlineSpan::bold(&body[..close]), end));
        }
    }

    let body = &rest[ITALIC_MARKER.len_utf8()..];
    let close = body.find(ITALIC_MARKER)?;
    let end = start + 2 * ITALIC_MARKER.len_utf8() + close;
    let inner = &body[..close];
    // `**` matched as a single-marker run opens and closes with the double
    // marker, so it is an (empty) bold run.
    let span = if inner.is_empty() { InlineSpan::bold("") } else { italic_span(inner) };
    Some((span, end))
}

fn italic_span(content: &str) -> InlineSpan {
    match find_confidence(content) {
        Some((at, label_start, end, level)) => InlineSpan::ConfidenceAnnotation {
            pre: content[..at].to_string(),
            level,
            label: content[label_start..end].to_string(),
            post: content[end..].to_string(),
        },
        None => InlineSpan::italic(content),
    }
}

/// Locate `Confidence Level: <High|Medium|Low>` (ASCII case-insensitive).
/// Returns (phrase start, level word start, phrase end, level).
fn find_confidence(content: &str) -> Option<(usize, usize, usize, ConfidenceLevel)> {
    let bytes = content.as_bytes();
    for (at, _) in content.char_indices() {
        let label_start = at + CONFIDENCE_PHRASE.len();
        if !starts_with_ignore_case(&bytes[at..], CONFIDENCE_PHRASE) {
            continue;
        }
        for level in ConfidenceLevel::ALL {
            if starts_with_ignore_case(&bytes[label_start..], level.as_str()) {
                return Some((at, label_start, label_start + level.as_str().len(), level));
            }
        }
    }
    None
}

fn starts_with_ignore_case(haystack: &[u8], needle: &str) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle.as_bytes())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn confidence(pre: &str, level: ConfidenceLevel, label: &str, post: &str) -> InlineSpan {
        InlineSpan::ConfidenceAnnotation {
            pre: pre.into(),
            level,
            label: label.into(),
            post: post.into(),
        }
    }

    // ── Emphasis ──────────────────────────────────────────────────────────────

    #[test]
    fn bold_then_italic() {
        assert_eq!(
            format_inline("**bold** and *plain-italic*"),
            vec![
                InlineSpan::bold("bold"),
                InlineSpan::text(" and "),
                InlineSpan::italic("plain-italic"),
            ]
        );
    }

    #[test]
    fn plain_line_is_single_text_span() {
        assert_eq!(format_inline("no markers here"), vec![InlineSpan::text("no markers here")]);
    }

    #[test]
    fn empty_line_has_no_spans() {
        assert!(format_inline("").is_empty());
    }

    #[test]
    fn adjacent_bold_runs_are_not_merged() {
        assert_eq!(
            format_inline("**a****b**"),
            vec![InlineSpan::bold("a"), InlineSpan::bold("b")]
        );
    }

    #[test]
    fn bold_content_is_not_rescanned() {
        assert_eq!(
            format_inline("**Criterion *A1***"),
            vec![InlineSpan::bold("Criterion *A1"), InlineSpan::text("*")]
        );
    }

    #[test]
    fn bold_label_followed_by_text() {
        assert_eq!(
            format_inline("**Rationale:** A brief summary."),
            vec![InlineSpan::bold("Rationale:"), InlineSpan::text(" A brief summary.")]
        );
    }

    #[test]
    fn lone_star_between_words_stays_text() {
        assert_eq!(format_inline("a * b"), vec![InlineSpan::text("a * b")]);
    }

    #[test]
    fn two_stars_pair_up_as_italic() {
        assert_eq!(
            format_inline("2 * 3 * 4"),
            vec![InlineSpan::text("2 "), InlineSpan::italic(" 3 "), InlineSpan::text(" 4")]
        );
    }

    #[test]
    fn unclosed_double_marker() {
        assert_eq!(
            format_inline("**abc"),
            vec![InlineSpan::bold(""), InlineSpan::text("abc")]
        );
        assert_eq!(format_inline("end *"), vec![InlineSpan::text("end *")]);
    }

    #[test]
    fn empty_runs_are_empty_bold() {
        assert_eq!(format_inline("****"), vec![InlineSpan::bold("")]);
        assert_eq!(format_inline("**"), vec![InlineSpan::bold("")]);
        assert_eq!(
            format_inline("a ** b"),
            vec![InlineSpan::text("a "), InlineSpan::bold(""), InlineSpan::text(" b")]
        );
    }

    #[test]
    fn runs_do_not_cross_newlines() {
        assert_eq!(format_inline("*a\nb*"), vec![InlineSpan::text("*a\nb*")]);
    }

    #[test]
    fn unicode_text_around_runs() {
        assert_eq!(
            format_inline("ä *ö* ü"),
            vec![InlineSpan::text("ä "), InlineSpan::italic("ö"), InlineSpan::text(" ü")]
        );
    }

    // ── Confidence annotations ────────────────────────────────────────────────

    #[test]
    fn bare_confidence_annotation() {
        assert_eq!(
            format_inline("*Confidence Level: High*"),
            vec![confidence("", ConfidenceLevel::High, "High", "")]
        );
    }

    #[test]
    fn confidence_is_case_insensitive_but_keeps_label() {
        assert_eq!(
            format_inline("*Given history, confidence level: mEDium (limited data)*"),
            vec![confidence(
                "Given history, ",
                ConfidenceLevel::Medium,
                "mEDium",
                " (limited data)"
            )]
        );
    }

    #[test]
    fn confidence_only_in_italic_runs() {
        assert_eq!(
            format_inline("**Confidence Level: Low**"),
            vec![InlineSpan::bold("Confidence Level: Low")]
        );
        assert_eq!(
            format_inline("Confidence Level: Low"),
            vec![InlineSpan::text("Confidence Level: Low")]
        );
    }

    #[test]
    fn unknown_level_stays_italic() {
        assert_eq!(
            format_inline("*Confidence Level: Moderate*"),
            vec![InlineSpan::italic("Confidence Level: Moderate")]
        );
    }

    #[test]
    fn icd_line_is_plain_italic() {
        assert_eq!(
            format_inline("*ICD-10: F32.x (Single Episode)*"),
            vec![InlineSpan::italic("ICD-10: F32.x (Single Episode)")]
        );
    }

    #[test]
    fn severity_orders_levels() {
        assert!(ConfidenceLevel::High.severity() > ConfidenceLevel::Medium.severity());
        assert!(ConfidenceLevel::Medium.severity() > ConfidenceLevel::Low.severity());
        assert_eq!(ConfidenceLevel::Low.to_string(), "Low");
    }
}
