use cliniq_config::DEFAULT_RISK_MARKER;

/// Flags replies that open with the responder's risk marker.
#[derive(Debug, Clone)]
pub struct RiskDetector {
    marker: String,
}

impl Default for RiskDetector {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_MARKER)
    }
}

impl RiskDetector {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// True iff `text` begins with the exact marker.  Only meaningful on a
    /// finished reply.
    pub fn detect(&self, text: &str) -> bool {
        !self.marker.is_empty() && text.starts_with(&self.marker)
    }

    /// `text` without the leading marker, for display.
    pub fn strip<'a>(&self, text: &'a str) -> &'a str {
        if self.detect(text) {
            text[self.marker.len()..].trim_start()
        } else {
            text
        }
    }
}
