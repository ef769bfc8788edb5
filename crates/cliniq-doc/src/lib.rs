// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Message text → renderable document tree.
//!
//! Assistant replies use a small markdown-like dialect: `###` headings, `* `
//! and `1. ` lists, fenced code, `---` rules, a trailing disclaimer line, and
//! `**bold**` / `*italic*` inline runs.  [`parse`] splits a message into
//! [`Block`]s and [`format_inline`] splits one line into [`InlineSpan`]s.
mod document;
mod inline;
mod parser;
mod render;

pub use document::{Block, Document};
pub use inline::{format_inline, ConfidenceLevel, InlineSpan};
pub use parser::parse;
pub use render::render_text;
