use crate::{format_inline, Block, Document, InlineSpan};

const DEFAULT_WIDTH: usize = 80;
const BULLET: &str = "  * ";
const CODE_INDENT: &str = "    ";

/// Render a document as plain terminal text, word-wrapped at `width`
/// columns (0 means 80).  Blocks are separated by one blank line.
pub fn render_text(doc: &Document, width: usize) -> String {
    let width = if width == 0 { DEFAULT_WIDTH } else { width };
    let mut lines: Vec<String> = Vec::new();

    for block in doc {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        match block {
            Block::Heading { text, .. } => {
                let text = render_inline(text);
                let underline = "=".repeat(text.chars().count());
                lines.push(text);
                lines.push(underline);
            }
            Block::Paragraph { lines: para } => {
                for line in para {
                    wrap(&render_inline(line), width, "", "", &mut lines);
                }
            }
            Block::UnorderedList { items } => {
                let hang = " ".repeat(BULLET.len());
                for item in items {
                    wrap(&render_inline(item), width, BULLET, &hang, &mut lines);
                }
            }
            Block::OrderedList { items } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = format!("  {}. ", i + 1);
                    let hang = " ".repeat(marker.len());
                    wrap(&render_inline(item), width, &marker, &hang, &mut lines);
                }
            }
            Block::CodeBlock { code } => {
                lines.extend(code.lines().map(|l| format!("{CODE_INDENT}{l}")));
            }
            Block::HorizontalRule => lines.push("-".repeat(width)),
            Block::Disclaimer { text } => {
                wrap(&format!("Disclaimer: {text}"), width, "", "", &mut lines);
            }
        }
    }

    lines.join("\n")
}

/// Flatten inline spans to plain text.  Emphasis markers are dropped and
/// confidence annotations are normalised to `[Confidence: <Level>]`.
fn render_inline(line: &str) -> String {
    format_inline(line)
        .into_iter()
        .map(|span| match span {
            InlineSpan::Text { value } | InlineSpan::Bold { value } | InlineSpan::Italic { value } => {
                value
            }
            InlineSpan::ConfidenceAnnotation { pre, level, post, .. } => {
                format!("{pre}[Confidence: {level}]{post}")
            }
        })
        .collect()
}

fn wrap(text: &str, width: usize, first_prefix: &str, rest_prefix: &str, out: &mut Vec<String>) {
    let mut line = first_prefix.to_string();
    let mut col = first_prefix.chars().count();
    let mut has_word = false;

    for word in text.split_inclusive(' ') {
        let len = word.trim_end().chars().count();
        if has_word && col + len > width {
            out.push(line.trim_end().to_string());
            line = rest_prefix.to_string();
            col = rest_prefix.chars().count();
            has_word = false;
        }
        line.push_str(word);
        col += word.chars().count();
        has_word = true;
    }
    out.push(line.trim_end().to_string());
}
