// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use cliniq_store::ChatRecord;

/// Events emitted while a reply streams into the transcript.
/// Consumers (the CLI chat loop, a UI) subscribe to these to drive their
/// output.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// The stream opened and the AI slot shows the placeholder
    Placeholder,
    /// The full reply text so far (republished after every delta)
    TextUpdated(String),
    /// The reply finished and the transcript was persisted
    Completed {
        text: String,
        risk_alert: bool,
        /// The saved record, `None` if persisting was refused
        record: Option<ChatRecord>,
    },
    /// The stream failed; the AI slot now holds `message`
    Failed { message: String, error: String },
}

impl ChatEvent {
    /// `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Completed { .. } | ChatEvent::Failed { .. })
    }
}
