// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Key under which the whole chat history is stored as one JSON array.
pub const DEFAULT_HISTORY_KEY: &str = "psychiatrist_chat_history";

/// Token the responder prepends to a reply when it detects a risk of harm.
pub const DEFAULT_RISK_MARKER: &str = "[RISK_ASSESSMENT_FLAG]";

pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome, Doctor. I am your AI Diagnostic Assistant. \
You can now upload relevant documents or images. Please provide patient symptoms, history, and \
observations to begin the analysis. All information is processed in-session and not stored. \
Please do not enter any personally identifiable information.";

pub const DEFAULT_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub responder: ResponderConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// Responder backend.  Only `"mock"` ships with the workspace; other
    /// backends are supplied by the embedding application.
    pub provider: String,
    /// Model name forwarded to the backend
    pub name: String,
    /// Environment variable that holds the API key (read at runtime)
    pub api_key_env: Option<String>,
    /// Explicit API key; prefer api_key_env in config files to avoid secrets
    /// in version-controlled files
    pub api_key: Option<String>,
    /// Sampling temperature (0.0–2.0)
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff
    pub top_p: Option<f32>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            provider: "mock".into(),
            name: "gemini-2.5-flash".into(),
            api_key_env: Some("API_KEY".into()),
            api_key: None,
            temperature: Some(0.5),
            top_p: Some(0.9),
        }
    }
}

impl ResponderConfig {
    /// Resolve the API key: explicit value first, then the named env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = &self.api_key {
            return Some(k.clone());
        }
        self.api_key_env.as_ref().and_then(|env| std::env::var(env).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the blob files.  Defaults to
    /// `$XDG_DATA_HOME/cliniq` (i.e. `~/.local/share/cliniq`).
    pub dir: Option<PathBuf>,
    /// Blob key of the history array.
    #[serde(default = "default_history_key")]
    pub history_key: String,
}

fn default_history_key() -> String {
    DEFAULT_HISTORY_KEY.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { dir: None, history_key: default_history_key() }
    }
}

impl StoreConfig {
    /// The effective blob directory.
    pub fn resolved_dir(&self) -> PathBuf {
        if let Some(d) = &self.dir {
            return d.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("cliniq")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed message every new session starts with.  It is never replayed to
    /// the responder.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    /// Shown in place of the partial reply when a stream fails.
    #[serde(default = "default_error_message")]
    pub error_message: String,
    /// Exact prefix that raises the risk alert.
    #[serde(default = "default_risk_marker")]
    pub risk_marker: String,
}

fn default_welcome_message() -> String {
    DEFAULT_WELCOME_MESSAGE.to_string()
}

fn default_error_message() -> String {
    DEFAULT_ERROR_MESSAGE.to_string()
}

fn default_risk_marker() -> String {
    DEFAULT_RISK_MARKER.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
            error_message: default_error_message(),
            risk_marker: default_risk_marker(),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
