// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tracing::trace;

use crate::{Block, Document};

const FENCE: &str = "```";
const HEADING_MARKER: &str = "### ";
const BULLET_MARKER: &str = "* ";
const RULE: &str = "---";
const DISCLAIMER_LABEL: &str = "Disclaimer:";

/// Parse message text into a [`Document`].
///
/// Blocks are separated by one or more blank (whitespace-only) lines.  Each
/// block is trimmed and classified by the first rule that matches:
///
/// 1. fenced code (starts **and** ends with a triple backtick)
/// 2. `### ` heading, which keeps only the first line of its block
/// 3. unordered list, when *every* line starts with `* `
/// 4. ordered list, when *every* line starts with `<digits>.<whitespace>`
/// 5. `---` horizontal rule
/// 6. a first line containing `Disclaimer:`
/// 7. paragraph, lines kept verbatim
///
/// Never fails: malformed input degrades to paragraphs.
pub fn parse(raw: &str) -> Document {
    let blocks: Vec<Block> = split_blocks(raw)
        .into_iter()
        .filter_map(|candidate| classify(&candidate))
        .collect();
    trace!(blocks = blocks.len(), "parsed document");
    Document { blocks }
}

/// Group consecutive non-blank lines.  A whitespace-only line ends a group.
fn split_blocks(raw: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in raw.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                groups.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        groups.push(current.join("\n"));
    }
    groups
}

fn classify(candidate: &str) -> Option<Block> {
    let block = candidate.trim();
    if block.is_empty() {
        return None;
    }

    if block.starts_with(FENCE) && block.ends_with(FENCE) {
        // A lone fence opens and closes on the same three characters.
        let inner = if block.len() >= 2 * FENCE.len() {
            &block[FENCE.len()..block.len() - FENCE.len()]
        } else {
            ""
        };
        return Some(Block::code(inner.trim()));
    }

    let lines: Vec<&str> = block.split('\n').collect();
    let first = lines[0].trim();

    if let Some(rest) = first.strip_prefix(HEADING_MARKER) {
        return Some(Block::heading(rest));
    }

    if lines.iter().all(|l| l.trim().starts_with(BULLET_MARKER)) {
        return Some(Block::unordered(
            lines.iter().map(|l| &l.trim()[BULLET_MARKER.len()..]),
        ));
    }

    let numbered: Option<Vec<&str>> = lines.iter().map(|l| strip_number(l.trim())).collect();
    if let Some(items) = numbered {
        return Some(Block::ordered(items));
    }

    if first == RULE {
        return Some(Block::HorizontalRule);
    }

    if first.contains(DISCLAIMER_LABEL) {
        let text = first.replace('*', "").replacen(DISCLAIMER_LABEL, "", 1);
        return Some(Block::disclaimer(text.trim()));
    }

    Some(Block::paragraph(lines))
}

/// `"12. item"` → `Some("item")`.  Exactly one whitespace character is
/// consumed after the period.
fn strip_number(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => Some(chars.as_str()),
        _ => None,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
