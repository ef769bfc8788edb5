//! Plain-text session export.
use cliniq_model::Message;

use crate::ChatRecord;

/// Line printed after every message in an export.
pub const SEPARATOR: &str = "--------------------";

/// `<Label>:\n<text>\n\n<20 dashes>\n\n` per message, concatenated.
pub fn export_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}:\n{}\n\n{SEPARATOR}\n\n", m.role.label(), m.text))
        .collect()
}

/// `session_<title>_<timestamp>.txt`, with every character of the title that
/// is not an ASCII letter or digit replaced by `_`, then lowercased.
pub fn export_file_name(record: &ChatRecord) -> String {
    let title: String = record
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("session_{title}_{}.txt", record.timestamp)
}
