use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{GenerationSettings, OutboundMessage, ResponseEvent, Turn};

pub type ResponseStream = Pin<Box<dyn Stream<Item = anyhow::Result<ResponseEvent>> + Send>>;

/// A live conversation with the model.  Keeps its own context: every
/// [`send`](Responder::send) builds on the turns before it.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Human-readable backend name for status display.
    fn name(&self) -> &str;

    /// Send one clinician turn and return the streamed reply.
    ///
    /// The stream ends with [`ResponseEvent::Done`] or
    /// [`ResponseEvent::Error`]; an `Err` item is treated like `Error`.
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<ResponseStream>;

    /// Turns the responder currently holds as context.
    fn history(&self) -> Vec<Turn>;
}

/// Creates [`Responder`]s and answers one-shot prompts.
#[async_trait]
pub trait ResponderFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Model parameters and system instruction the backend was built with.
    /// Test doubles that ignore them return `None`.
    fn settings(&self) -> Option<&GenerationSettings> {
        None
    }

    /// Start a conversation, optionally resuming from earlier turns.
    fn start(&self, history: Vec<Turn>) -> anyhow::Result<Box<dyn Responder>>;

    /// Single non-streaming completion (used for note summaries).
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
