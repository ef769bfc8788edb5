/// Integration tests for cliniq's library path using the scripted responder.
use std::sync::Arc;

use cliniq_config::{Config, SessionConfig, StoreConfig};
use cliniq_core::{generate_soap_note, system_instruction, ChatEvent, Consultation, PatientIntake, RiskDetector};
use cliniq_doc::{format_inline, parse, render_text, Block, InlineSpan};
use cliniq_model::{ResponseEvent, Role, ScriptedResponderFactory};
use cliniq_store::{
    export_file_name, export_transcript, FileBlobStore, MemoryBlobStore, SessionStore,
};
use tokio::sync::mpsc;

const REPLY: &str = "### Differential\n\n\
* **Major depressive disorder** *(Confidence Level: High)*\n\
* *Adjustment disorder*\n\n\
---\n\n\
Disclaimer: decision support only.";

fn script(deltas: &[&str]) -> Vec<ResponseEvent> {
    let mut s: Vec<ResponseEvent> =
        deltas.iter().map(|d| ResponseEvent::TextDelta(d.to_string())).collect();
    s.push(ResponseEvent::Done);
    s
}

async fn send<B: cliniq_store::BlobStore>(c: &mut Consultation<B>, text: &str) -> Vec<ChatEvent> {
    let (tx, mut rx) = mpsc::channel(64);
    c.send(text, None, tx).await.unwrap();
    let mut events = Vec::new();
    while let Some(ev) = rx.recv().await {
        events.push(ev);
    }
    events
}

#[test]
fn config_defaults_are_valid() {
    let cfg = Config::default();
    assert_eq!(cfg.responder.provider, "mock");
    assert!(!cfg.session.welcome_message.is_empty());
    assert!(!cfg.store.history_key.is_empty());
}

#[test]
fn configured_backend_gets_system_instruction_and_settings() {
    let mut cfg = Config::default();
    cfg.session.risk_marker = "[HARM]".into();
    cfg.responder.api_key = Some("key-from-config".into());
    let f = cliniq_model::from_config(&cfg.responder, &system_instruction(&cfg.session.risk_marker))
        .unwrap();
    let s = f.settings().unwrap();
    assert!(s.system_instruction.contains("[HARM]"));
    assert_eq!(s.api_key.as_deref(), Some("key-from-config"));
    assert_eq!(s.top_p, cfg.responder.top_p);
}

#[tokio::test]
async fn consultation_persists_to_disk_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StoreConfig { dir: Some(dir.path().to_path_buf()), ..Default::default() };
    let factory = ScriptedResponderFactory::new(vec![
        script(&["### Differential\n\n", "* **MDD** (Confidence Level: High)"]),
        script(&["Consider a PHQ-9."]),
    ]);

    let id = {
        let mut c =
            Consultation::new(Arc::new(factory.clone()), SessionStore::open(&cfg), SessionConfig::default())
                .unwrap();
        send(&mut c, "Low mood for six weeks").await;
        send(&mut c, "Any screening tool").await;
        assert_eq!(c.messages().len(), 5);
        c.active_chat_id().unwrap().to_string()
    };

    assert!(dir.path().join(format!("{}.json", cfg.history_key)).exists());

    let store = SessionStore::open(&cfg);
    let history = store.load_history();
    assert_eq!(history.len(), 1);
    let record = store.require_record(&id).unwrap();
    assert_eq!(record.title, "Any screening tool");
    assert_eq!(record.messages[0].role, Role::Ai);
    assert_eq!(record.messages[4].text, "Consider a PHQ-9.");

    // Resuming replays everything after the welcome message.
    let mut c = Consultation::new(Arc::new(factory.clone()), store, SessionConfig::default()).unwrap();
    c.select_chat(&id).unwrap();
    assert_eq!(c.messages().len(), 5);
    assert_eq!(factory.started_with.lock().unwrap().last().map(Vec::len), Some(4));
}

#[tokio::test]
async fn rendered_reply_round_trip() {
    let factory = ScriptedResponderFactory::deltas(&[&REPLY[..20], &REPLY[20..]]);
    let mut c = Consultation::new(
        Arc::new(factory),
        SessionStore::new(Arc::new(MemoryBlobStore::new()), "history"),
        SessionConfig::default(),
    )
    .unwrap();
    let events = send(&mut c, "Patient reports anhedonia").await;
    let Some(ChatEvent::Completed { text, risk_alert, record }) = events.last() else {
        panic!("no completion in {events:?}");
    };
    assert_eq!(text, REPLY);
    assert!(!risk_alert);
    assert!(record.is_some());

    let doc = parse(text);
    let blocks: Vec<&Block> = doc.iter().collect();
    assert_eq!(blocks.len(), 4);
    assert!(matches!(blocks[0], Block::Heading { text, .. } if text == "Differential"));
    assert!(matches!(blocks[2], Block::HorizontalRule));
    assert!(matches!(blocks[3], Block::Disclaimer { text } if text == "decision support only."));

    let Block::UnorderedList { items } = blocks[1] else {
        panic!("expected a list, got {:?}", blocks[1]);
    };
    let spans = format_inline(&items[0]);
    assert_eq!(spans[0], InlineSpan::bold("Major depressive disorder"));
    assert!(spans
        .iter()
        .any(|s| matches!(s, InlineSpan::ConfidenceAnnotation { .. })));

    let out = render_text(&doc, 60);
    assert!(out.starts_with("Differential\n"));
    assert!(out.contains("  * Major depressive disorder"));
    assert!(out.contains("[Confidence: High]"));
    assert!(out.contains("Disclaimer: decision support only."));
    assert!(!out.contains("**"));
}

#[tokio::test]
async fn risk_flagged_reply_is_stripped_for_display() {
    let detector = RiskDetector::default();
    let flagged = format!("{} Immediate safety planning advised.", detector.marker());
    let factory = ScriptedResponderFactory::deltas(&[&flagged]);
    let mut c = Consultation::new(
        Arc::new(factory),
        SessionStore::new(Arc::new(MemoryBlobStore::new()), "history"),
        SessionConfig::default(),
    )
    .unwrap();
    send(&mut c, "Patient mentions a plan").await;
    assert!(c.risk_alert());

    let stored = &c.messages()[2].text;
    assert!(detector.detect(stored));
    let out = render_text(&parse(detector.strip(stored)), 80);
    assert_eq!(out, "Immediate safety planning advised.");
}

#[tokio::test]
async fn intake_prompt_starts_a_session() {
    let form = PatientIntake {
        identifier: "PT-7".into(),
        age: "34".into(),
        chief_complaint: "Panic attacks".into(),
        ..Default::default()
    };
    let prompt = form.to_prompt().unwrap();

    let factory = ScriptedResponderFactory::deltas(&["Noted."]);
    let mut c = Consultation::new(
        Arc::new(factory.clone()),
        SessionStore::new(Arc::new(MemoryBlobStore::new()), "history"),
        SessionConfig::default(),
    )
    .unwrap();
    send(&mut c, &prompt).await;
    assert_eq!(factory.sent.lock().unwrap()[0].text, prompt);
    assert!(c.messages()[1].text.contains("PT-7"));
}

#[tokio::test]
async fn export_and_note_from_saved_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(FileBlobStore::new(dir.path()), "history");
    let factory = ScriptedResponderFactory::deltas(&["Sleep hygiene first."])
        .with_note("**S:** poor sleep\n**O:** tired\n**A:** insomnia\n**P:** CBT-I");
    let mut c =
        Consultation::new(Arc::new(factory.clone()), store, SessionConfig::default()).unwrap();
    send(&mut c, "Cannot sleep, what next?").await;
    let id = c.active_chat_id().unwrap().to_string();

    let record = c.store().require_record(&id).unwrap();
    let text = export_transcript(&record.messages);
    assert!(text.starts_with("AI Assistant:\n"));
    assert!(text.contains("Clinician:\nCannot sleep, what next?\n"));
    assert_eq!(text.matches("--------------------").count(), 3);

    let name = export_file_name(&record);
    assert_eq!(name, format!("session_cannot_sleep__what_next__{}.txt", record.timestamp));

    let note = generate_soap_note(&factory, &record.messages).await.unwrap();
    assert!(note.contains("CBT-I"));
    let prompt = &factory.prompts.lock().unwrap()[0];
    assert!(prompt.contains("Cannot sleep, what next?"));
    assert!(!prompt.contains(&SessionConfig::default().welcome_message));
}

#[tokio::test]
async fn delete_leaves_other_sessions() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let factory = ScriptedResponderFactory::new(vec![script(&["one"]), script(&["two"])]);
    let mut c = Consultation::new(
        Arc::new(factory),
        SessionStore::new(blobs.clone(), "history"),
        SessionConfig::default(),
    )
    .unwrap();
    send(&mut c, "first").await;
    let first = c.active_chat_id().unwrap().to_string();
    c.new_chat().unwrap();
    send(&mut c, "second").await;
    assert_eq!(c.history().len(), 2);

    c.delete_chat(&first).unwrap();
    let left = SessionStore::new(blobs, "history").load_history();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].title, "second");
}
