use base64::Engine as _;
use cliniq_config::ResponderConfig;
use serde::{Deserialize, Serialize};

// ─── Message types ────────────────────────────────────────────────────────────

/// Who authored a transcript entry.  Serialized as `"user"` / `"ai"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl Role {
    /// Label used in exports and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "Clinician",
            Role::Ai => "AI Assistant",
        }
    }
}

/// A single entry in a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self { role: Role::Ai, text: text.into() }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

// ─── Outbound content ─────────────────────────────────────────────────────────

/// Binary payload sent along with a user message (document scan, image…).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self { mime_type: mime_type.into(), data: data.into() }
    }

    /// Standard base64 of the payload, as inline-data APIs expect it.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// `data:<mime>;base64,<b64>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Parse a data URL of the form `data:<mime>;base64,<b64>`.
    pub fn from_data_url(url: &str) -> anyhow::Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| anyhow::anyhow!("not a data URL"))?;
        let (meta, b64) = rest
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("malformed data URL"))?;
        let mime = meta.strip_suffix(";base64").unwrap_or(meta);
        let data = base64::engine::general_purpose::STANDARD.decode(b64)?;
        Ok(Self::new(mime, data))
    }
}

/// One clinician turn handed to a [`crate::Responder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), attachment: None }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

// ─── Replay history ───────────────────────────────────────────────────────────

/// Role names as responders understand them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// A prior exchange entry used to resume a responder session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl From<&Message> for Turn {
    fn from(m: &Message) -> Self {
        let role = match m.role {
            Role::User => TurnRole::User,
            Role::Ai => TurnRole::Model,
        };
        Self { role, text: m.text.clone() }
    }
}

// ─── Streaming ────────────────────────────────────────────────────────────────

/// A single streamed event from the responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// A text delta streamed from the model
    TextDelta(String),
    /// The stream finished normally
    Done,
    /// The responder gave up mid-stream
    Error(String),
}

// ─── Backend settings ─────────────────────────────────────────────────────────

/// Everything a backend needs to talk to its model, resolved from
/// [`ResponderConfig`] once at start-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    /// Sent ahead of every conversation the backend starts.
    pub system_instruction: String,
}

impl GenerationSettings {
    pub fn from_config(cfg: &ResponderConfig, system_instruction: impl Into<String>) -> Self {
        Self {
            model: cfg.name.clone(),
            api_key: cfg.resolve_api_key(),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            system_instruction: system_instruction.into(),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
