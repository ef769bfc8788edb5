// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use cliniq_config::SessionConfig;
use cliniq_model::{
    Attachment, Message, OutboundMessage, Responder, ResponderFactory, ResponseEvent,
    ResponseStream, Turn,
};
use cliniq_store::{BlobStore, ChatRecord, RecordDraft, SessionStore};

use crate::{
    assembler::{StreamAssembler, PLACEHOLDER},
    events::ChatEvent,
    risk::RiskDetector,
    soap::generate_soap_note,
    ConsultError,
};

/// Responder context for resuming a saved transcript: everything except the
/// seed message.
pub fn replay_turns(messages: &[Message]) -> Vec<Turn> {
    messages.iter().skip(1).map(Turn::from).collect()
}

/// A reply that has been requested but not yet drained.
///
/// Feed each stream item to [`Consultation::apply`] with `generation`, then
/// call [`Consultation::end_of_stream`] when the stream runs dry.
pub struct PendingResponse {
    pub generation: u64,
    pub stream: ResponseStream,
}

struct InFlight {
    generation: u64,
    /// Text of the message that triggered the reply; becomes the title.
    prompt: String,
    /// Transcript length before the clinician's message was appended.
    rollback_len: usize,
    assembler: StreamAssembler,
}

/// One clinician session: the transcript on screen, the responder holding
/// its context, and the store it is persisted to.
///
/// At most one reply streams at a time.  Every reply is tagged with the
/// current generation; starting, selecting or deleting the active session
/// bumps the generation so events from an abandoned stream are dropped.
pub struct Consultation<B: BlobStore> {
    factory: Arc<dyn ResponderFactory>,
    responder: Box<dyn Responder>,
    store: SessionStore<B>,
    settings: SessionConfig,
    risk: RiskDetector,
    messages: Vec<Message>,
    active_chat_id: Option<String>,
    history: Vec<ChatRecord>,
    loading: bool,
    risk_alert: bool,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl<B: BlobStore> Consultation<B> {
    /// Open a fresh session.  Fails if the backend cannot start a responder.
    pub fn new(
        factory: Arc<dyn ResponderFactory>,
        store: SessionStore<B>,
        settings: SessionConfig,
    ) -> Result<Self, ConsultError> {
        let responder = start_responder(factory.as_ref(), Vec::new())?;
        let history = store.load_history();
        let risk = RiskDetector::new(settings.risk_marker.clone());
        let messages = vec![Message::ai(settings.welcome_message.clone())];
        Ok(Self {
            factory,
            responder,
            store,
            settings,
            risk,
            messages,
            active_chat_id: None,
            history,
            loading: false,
            risk_alert: false,
            generation: 0,
            in_flight: None,
        })
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Saved sessions, newest first.
    pub fn history(&self) -> &[ChatRecord] {
        &self.history
    }

    pub fn active_chat_id(&self) -> Option<&str> {
        self.active_chat_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Set when the latest finished reply opened with the risk marker.
    /// Stays set until dismissed or the session changes.
    pub fn risk_alert(&self) -> bool {
        self.risk_alert
    }

    pub fn dismiss_risk_alert(&mut self) {
        self.risk_alert = false;
    }

    pub fn risk_detector(&self) -> &RiskDetector {
        &self.risk
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn responder_name(&self) -> &str {
        self.responder.name()
    }

    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    /// Re-read the saved sessions from the store.
    pub fn refresh_history(&mut self) -> &[ChatRecord] {
        self.history = self.store.load_history();
        &self.history
    }

    // ─── Sending ─────────────────────────────────────────────────────────────

    /// Append the clinician's message and open the reply stream.
    ///
    /// On success the AI slot holds the placeholder.  If the responder
    /// refuses the message, the error message takes the AI slot, loading
    /// clears and nothing is persisted.
    pub async fn begin_send(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<PendingResponse, ConsultError> {
        if self.loading {
            return Err(ConsultError::Busy);
        }
        if text.trim().is_empty() && attachment.is_none() {
            return Err(ConsultError::EmptyInput);
        }

        let rollback_len = self.messages.len();
        self.messages.push(Message::user(text));
        self.loading = true;

        let mut outbound = OutboundMessage::text(text);
        if let Some(a) = attachment {
            outbound = outbound.with_attachment(a);
        }

        match self.responder.send(outbound).await {
            Ok(stream) => {
                self.messages.push(Message::ai(PLACEHOLDER));
                self.in_flight = Some(InFlight {
                    generation: self.generation,
                    prompt: text.to_string(),
                    rollback_len,
                    assembler: StreamAssembler::new(),
                });
                debug!(generation = self.generation, "reply stream opened");
                Ok(PendingResponse { generation: self.generation, stream })
            }
            Err(e) => {
                warn!(error = %e, "responder rejected message");
                self.messages.push(Message::ai(self.settings.error_message.clone()));
                self.loading = false;
                Err(ConsultError::Responder(format!("{e:#}")))
            }
        }
    }

    /// Apply one stream item to the reply tagged `generation`.
    ///
    /// Returns `None` when nothing visible changed: the item belongs to an
    /// abandoned generation, or it was an empty delta.
    pub fn apply(
        &mut self,
        generation: u64,
        event: anyhow::Result<ResponseEvent>,
    ) -> Option<ChatEvent> {
        if !self.is_current(generation) {
            debug!(generation, current = self.generation, "dropping event from stale stream");
            return None;
        }
        match event {
            Ok(ResponseEvent::TextDelta(delta)) => {
                let flight = self.in_flight.as_mut()?;
                if !flight.assembler.push(&delta) {
                    return None;
                }
                let text = flight.assembler.text().to_string();
                if let Some(slot) = self.messages.last_mut() {
                    slot.text = text.clone();
                }
                Some(ChatEvent::TextUpdated(text))
            }
            Ok(ResponseEvent::Done) => self.complete(),
            Ok(ResponseEvent::Error(e)) => self.fail(e),
            Err(e) => self.fail(format!("{e:#}")),
        }
    }

    /// The stream for `generation` ended.  A stream that stops without an
    /// explicit `Done` completes normally.
    pub fn end_of_stream(&mut self, generation: u64) -> Option<ChatEvent> {
        if !self.is_current(generation) {
            return None;
        }
        self.complete()
    }

    /// Send a message and drain the reply, forwarding every [`ChatEvent`]
    /// to `tx`.
    pub async fn send(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
        tx: mpsc::Sender<ChatEvent>,
    ) -> Result<(), ConsultError> {
        let (_keep, cancel) = oneshot::channel();
        self.send_with_cancel(text, attachment, tx, cancel).await
    }

    /// Like [`send`](Self::send) but abandons the reply when `cancel`
    /// resolves.  See [`cancel`](Self::cancel).
    pub async fn send_with_cancel(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
        tx: mpsc::Sender<ChatEvent>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<(), ConsultError> {
        let PendingResponse { generation, mut stream } = self.begin_send(text, attachment).await?;
        let _ = tx.send(ChatEvent::Placeholder).await;

        loop {
            let item = tokio::select! {
                item = stream.next() => item,
                _ = &mut cancel => {
                    info!(generation, "reply cancelled");
                    self.cancel();
                    return Ok(());
                }
            };
            let event = match item {
                Some(item) => self.apply(generation, item),
                None => {
                    if let Some(ev) = self.end_of_stream(generation) {
                        let _ = tx.send(ev).await;
                    }
                    return Ok(());
                }
            };
            if let Some(ev) = event {
                let done = ev.is_terminal();
                let _ = tx.send(ev).await;
                if done {
                    return Ok(());
                }
            }
        }
    }

    /// Abandon the streaming reply.  The clinician's message and the partial
    /// reply are taken off the transcript and the responder is restarted
    /// from what remains, so neither the store nor the model context ever
    /// sees the abandoned exchange.
    pub fn cancel(&mut self) {
        let Some(rollback_len) = self.in_flight.as_ref().map(|f| f.rollback_len) else {
            return;
        };
        self.abandon_in_flight();
        self.messages.truncate(rollback_len);
        // On failure the old responder stays; its context still holds the
        // abandoned message.
        if let Ok(responder) = start_responder(self.factory.as_ref(), replay_turns(&self.messages)) {
            self.responder = responder;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
            && self.in_flight.as_ref().is_some_and(|f| f.generation == generation)
    }

    fn complete(&mut self) -> Option<ChatEvent> {
        let flight = self.in_flight.take()?;
        let text = flight.assembler.finish();
        if let Some(slot) = self.messages.last_mut() {
            slot.text = text.clone();
        }
        self.loading = false;

        self.risk_alert = self.risk.detect(&text);
        if self.risk_alert {
            warn!("reply carries the risk marker");
        }

        let id = match &self.active_chat_id {
            Some(id) => id.clone(),
            None => {
                let id = self.store.generate_chat_id();
                self.active_chat_id = Some(id.clone());
                id
            }
        };
        let draft = RecordDraft::new(id, flight.prompt, self.messages.clone());
        let record = match self.store.save_record(draft) {
            Ok(record) => {
                self.upsert_history(record.clone());
                Some(record)
            }
            Err(e) => {
                warn!(error = %e, "transcript not saved");
                None
            }
        };
        Some(ChatEvent::Completed { text, risk_alert: self.risk_alert, record })
    }

    fn fail(&mut self, error: String) -> Option<ChatEvent> {
        self.in_flight.take()?;
        warn!(%error, "reply stream failed");
        let message = self.settings.error_message.clone();
        if let Some(slot) = self.messages.last_mut() {
            slot.text = message.clone();
        }
        self.loading = false;
        Some(ChatEvent::Failed { message, error })
    }

    fn upsert_history(&mut self, record: ChatRecord) {
        match self.history.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.history.insert(0, record),
        }
    }

    fn abandon_in_flight(&mut self) {
        self.generation += 1;
        self.loading = false;
        if let Some(flight) = self.in_flight.take() {
            debug!(
                generation = flight.generation,
                deltas = flight.assembler.delta_count(),
                "abandoned in-flight reply"
            );
        }
    }

    // ─── Session switching ───────────────────────────────────────────────────

    /// Drop the current session and start over with only the seed message.
    pub fn new_chat(&mut self) -> Result<(), ConsultError> {
        let responder = start_responder(self.factory.as_ref(), Vec::new())?;
        self.abandon_in_flight();
        self.responder = responder;
        self.active_chat_id = None;
        self.messages = vec![Message::ai(self.settings.welcome_message.clone())];
        self.risk_alert = false;
        Ok(())
    }

    /// Load a saved session and resume its responder context.
    pub fn select_chat(&mut self, id: &str) -> Result<(), ConsultError> {
        let record = self.store.require_record(id)?;
        let responder = start_responder(self.factory.as_ref(), replay_turns(&record.messages))?;
        self.abandon_in_flight();
        self.responder = responder;
        self.risk_alert = record
            .messages
            .iter()
            .rev()
            .find(|m| !m.is_user())
            .is_some_and(|m| self.risk.detect(&m.text));
        debug!(id = %record.id, messages = record.messages.len(), "resumed chat");
        self.active_chat_id = Some(record.id);
        self.messages = record.messages;
        Ok(())
    }

    /// Delete a saved session.  Deleting the active one starts a new chat.
    pub fn delete_chat(&mut self, id: &str) -> Result<(), ConsultError> {
        self.history = self.store.delete_record_from_history(id);
        if self.active_chat_id.as_deref() == Some(id) {
            self.new_chat()?;
        }
        Ok(())
    }

    // ─── Notes ───────────────────────────────────────────────────────────────

    /// SOAP note of the on-screen transcript.
    pub async fn soap_note(&self) -> Result<String, ConsultError> {
        generate_soap_note(self.factory.as_ref(), &self.messages).await
    }
}

fn start_responder(
    factory: &dyn ResponderFactory,
    history: Vec<Turn>,
) -> Result<Box<dyn Responder>, ConsultError> {
    factory.start(history).map_err(|e| {
        warn!(backend = factory.name(), error = %e, "responder failed to start");
        ConsultError::ResponderInit(format!("{e:#}"))
    })
}
