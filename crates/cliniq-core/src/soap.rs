use cliniq_model::{Message, ResponderFactory};
use tracing::{debug, warn};

use crate::prompts::{CONVERSATION_SLOT, SOAP_NOTE_TEMPLATE};
use crate::ConsultError;

/// Seed message plus at least one exchange.
pub const MIN_NOTE_MESSAGES: usize = 3;

/// The note prompt for a transcript.  The seed message is left out; every
/// other message becomes `<Label>: <text>`, separated by blank lines.
pub fn soap_prompt(messages: &[Message]) -> String {
    let conversation = messages
        .iter()
        .skip(1)
        .map(|m| format!("{}: {}", m.role.label(), m.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    SOAP_NOTE_TEMPLATE.replacen(CONVERSATION_SLOT, &conversation, 1)
}

/// Ask the responder backend for a SOAP note of the transcript.
pub async fn generate_soap_note(
    factory: &dyn ResponderFactory,
    messages: &[Message],
) -> Result<String, ConsultError> {
    if messages.len() < MIN_NOTE_MESSAGES {
        return Err(ConsultError::NotEnoughContext);
    }
    let prompt = soap_prompt(messages);
    debug!(messages = messages.len(), prompt_len = prompt.len(), "requesting SOAP note");
    factory.generate(&prompt).await.map_err(|e| {
        warn!(error = %e, "SOAP note generation failed");
        ConsultError::NoteFailed(format!("{e:#}"))
    })
}

#[cfg(test)]
mod tests {
    use cliniq_model::ScriptedResponderFactory;

    use super::*;

    fn transcript() -> Vec<Message> {
        vec![
            Message::ai("Welcome, Doctor."),
            Message::user("Low mood for 3 weeks."),
            Message::ai("Considerations include MDD."),
        ]
    }

    #[test]
    fn prompt_skips_seed_and_labels_roles() {
        let p = soap_prompt(&transcript());
        assert!(!p.contains("Welcome, Doctor."));
        assert!(p.contains(
            "---\nClinician: Low mood for 3 weeks.\n\nAI Assistant: Considerations include MDD.\n---"
        ));
        assert!(!p.contains(CONVERSATION_SLOT));
    }

    #[tokio::test]
    async fn too_short_transcript_is_rejected() {
        let f = ScriptedResponderFactory::new(vec![]).with_note("S: ...");
        let err = generate_soap_note(&f, &transcript()[..2]).await.unwrap_err();
        assert!(matches!(err, ConsultError::NotEnoughContext));
        assert!(f.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn note_comes_from_backend() {
        let f = ScriptedResponderFactory::new(vec![]).with_note("S: low mood");
        let note = generate_soap_note(&f, &transcript()).await.unwrap();
        assert_eq!(note, "S: low mood");
        assert_eq!(f.prompts.lock().unwrap()[0], soap_prompt(&transcript()));
    }

    #[tokio::test]
    async fn backend_failure_is_note_failed() {
        let f = ScriptedResponderFactory::new(vec![]);
        let err = generate_soap_note(&f, &transcript()).await.unwrap_err();
        assert!(matches!(err, ConsultError::NoteFailed(_)));
    }
}
