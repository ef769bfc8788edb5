/// Shown in the AI slot from the moment the stream opens until the first
/// delta arrives.
pub const PLACEHOLDER: &str = "...";

/// Accumulates streamed deltas into one growing reply.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    text: String,
    deltas: usize,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta.  Returns `false` (and changes nothing) for an empty
    /// delta.
    pub fn push(&mut self, delta: &str) -> bool {
        if delta.is_empty() {
            return false;
        }
        self.text.push_str(delta);
        self.deltas += 1;
        true
    }

    /// Everything received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// What the AI slot should show right now.
    pub fn display_text(&self) -> &str {
        if self.deltas == 0 {
            PLACEHOLDER
        } else {
            &self.text
        }
    }

    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    /// The final reply.  Empty when no delta ever arrived.
    pub fn finish(self) -> String {
        self.text
    }
}
