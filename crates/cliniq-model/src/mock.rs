// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use crate::{
    provider::ResponseStream, GenerationSettings, OutboundMessage, Responder, ResponderFactory, ResponseEvent, Turn,
    TurnRole,
};

fn push_exchange(history: &Mutex<Vec<Turn>>, user: &str, model: String) {
    let mut h = history.lock().unwrap();
    h.push(Turn { role: TurnRole::User, text: user.to_string() });
    h.push(Turn { role: TurnRole::Model, text: model });
}

// ─── Echo mock ────────────────────────────────────────────────────────────────

/// Deterministic mock backend.  Echoes each clinician message back, streamed
/// one word per delta.
#[derive(Default)]
pub struct MockResponderFactory {
    settings: GenerationSettings,
}

impl MockResponderFactory {
    pub fn new(settings: GenerationSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ResponderFactory for MockResponderFactory {
    fn name(&self) -> &str {
        "mock"
    }

    fn settings(&self) -> Option<&GenerationSettings> {
        Some(&self.settings)
    }

    fn start(&self, history: Vec<Turn>) -> anyhow::Result<Box<dyn Responder>> {
        Ok(Box::new(MockResponder { history: Mutex::new(history) }))
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(format!("MOCK: {}", prompt.trim()))
    }
}

struct MockResponder {
    history: Mutex<Vec<Turn>>,
}

#[async_trait]
impl Responder for MockResponder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, message: OutboundMessage) -> anyhow::Result<ResponseStream> {
        let mut reply = format!("MOCK: {}", message.text);
        if let Some(a) = &message.attachment {
            reply.push_str(&format!(" [{} attachment, {} bytes]", a.mime_type, a.data.len()));
        }
        push_exchange(&self.history, &message.text, reply.clone());

        let mut events: Vec<anyhow::Result<ResponseEvent>> = reply
            .split_inclusive(' ')
            .map(|w| Ok(ResponseEvent::TextDelta(w.to_string())))
            .collect();
        events.push(Ok(ResponseEvent::Done));
        Ok(Box::pin(stream::iter(events)))
    }

    fn history(&self) -> Vec<Turn> {
        self.history.lock().unwrap().clone()
    }
}

// ─── Scripted mock ────────────────────────────────────────────────────────────

/// A pre-scripted mock backend.  Each `send` (on any responder started from
/// the factory) pops the next event script from the front of the queue, so
/// tests can specify exact delta sequences and failures without network
/// access.
#[derive(Clone)]
pub struct ScriptedResponderFactory {
    scripts: Arc<Mutex<Vec<Vec<ResponseEvent>>>>,
    note: Arc<Mutex<Option<String>>>,
    fail_start: bool,
    fail_send: Arc<Mutex<Option<String>>>,
    /// History passed to every `start()` call, in order.
    pub started_with: Arc<Mutex<Vec<Vec<Turn>>>>,
    /// Every message handed to `send()`, in order.
    pub sent: Arc<Mutex<Vec<OutboundMessage>>>,
    /// Every prompt handed to `generate()`, in order.
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResponderFactory {
    /// Build a factory from a list of response scripts.
    /// The outer `Vec` is the ordered list of sends; the inner `Vec` is the
    /// sequence of [`ResponseEvent`]s emitted for that send.
    pub fn new(scripts: Vec<Vec<ResponseEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            note: Arc::new(Mutex::new(None)),
            fail_start: false,
            fail_send: Arc::new(Mutex::new(None)),
            started_with: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: every send replies with the given deltas, then `Done`.
    pub fn deltas(deltas: &[&str]) -> Self {
        let mut script: Vec<ResponseEvent> =
            deltas.iter().map(|d| ResponseEvent::TextDelta(d.to_string())).collect();
        script.push(ResponseEvent::Done);
        Self::new(vec![script])
    }

    /// Reply returned by `generate()`.  Without one, `generate()` fails.
    pub fn with_note(self, note: impl Into<String>) -> Self {
        *self.note.lock().unwrap() = Some(note.into());
        self
    }

    /// Make `start()` fail, as a misconfigured backend would.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make the next `send()` fail before any stream is returned.
    pub fn fail_next_send(&self, reason: impl Into<String>) {
        *self.fail_send.lock().unwrap() = Some(reason.into());
    }

    /// Append another script to the queue.
    pub fn push_script(&self, script: Vec<ResponseEvent>) {
        self.scripts.lock().unwrap().push(script);
    }
}

#[async_trait]
impl ResponderFactory for ScriptedResponderFactory {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    fn start(&self, history: Vec<Turn>) -> anyhow::Result<Box<dyn Responder>> {
        if self.fail_start {
            anyhow::bail!("scripted responder refused to start");
        }
        self.started_with.lock().unwrap().push(history.clone());
        Ok(Box::new(ScriptedResponder {
            factory: self.clone(),
            history: Mutex::new(history),
        }))
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.note
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no scripted note"))
    }
}

struct ScriptedResponder {
    factory: ScriptedResponderFactory,
    history: Mutex<Vec<Turn>>,
}

#[async_trait]
impl Responder for ScriptedResponder {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn send(&self, message: OutboundMessage) -> anyhow::Result<ResponseStream> {
        if let Some(reason) = self.factory.fail_send.lock().unwrap().take() {
            anyhow::bail!(reason);
        }
        self.factory.sent.lock().unwrap().push(message.clone());
        let events = {
            let mut scripts = self.factory.scripts.lock().unwrap();
            if scripts.is_empty() {
                // Default fallback when all scripts are consumed
                vec![
                    ResponseEvent::TextDelta("[no more scripts]".into()),
                    ResponseEvent::Done,
                ]
            } else {
                scripts.remove(0)
            }
        };
        let reply: String = events
            .iter()
            .filter_map(|e| match e {
                ResponseEvent::TextDelta(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        push_exchange(&self.history, &message.text, reply);

        let wrapped: Vec<anyhow::Result<ResponseEvent>> = events.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(wrapped)))
    }

    fn history(&self) -> Vec<Turn> {
        self.history.lock().unwrap().clone()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
