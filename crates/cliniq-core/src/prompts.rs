// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

const RISK_MARKER_SLOT: &str = "{RISK_MARKER}";

/// System instruction handed to conversational responders.  `{RISK_MARKER}`
/// is filled in by [`system_instruction`].
const SYSTEM_INSTRUCTION_TEMPLATE: &str = r#"
You are a sophisticated AI assistant designed for psychiatrists and mental health professionals. Your purpose is to aid in the diagnostic process by analyzing patient information based on established psychiatric knowledge.

Your core functions are:
1.  **Symptom Analysis:** Concisely analyze symptoms, history, and behavioral observations.
2.  **Differential Diagnosis with DSM-5 & ICD-10 Categorization:** Generate a list of potential differential diagnoses. For *each* potential diagnosis, include the relevant ICD-10 code(s) and structure your analysis for maximum scannability and conciseness. Use clear and consistent markdown formatting as follows:

    ### **Major Depressive Disorder**
    *ICD-10: F32.x (Single Episode), F33.x (Recurrent)*

    **Evidence Supports:**
    *   **Criterion A1 (Depressed Mood):** Patient reports "feeling down and empty."
    *   **Criterion A2 (Anhedonia):** States they have "lost interest in hobbies."

    **Further Inquiry Needed:**
    *   **Criterion A5 (Psychomotor Changes):** Requires clinical observation.
    *   **Criterion C (Substance Use):** Requires clarification on substance use history.

    **Rationale:** A brief summary explaining why this diagnosis is a relevant consideration.

3.  **Evidence-Based Treatment Considerations:** For the most likely diagnoses, briefly outline first-line treatment considerations based on established clinical guidelines (e.g., from the APA). This may include psychotherapy modalities (e.g., CBT, DBT) and psychopharmacological classes (e.g., SSRIs). Frame these as informational suggestions for the clinician to consider.
4.  **Clarification:** If information is ambiguous, ask targeted clarifying questions.
5.  **Professional Tone:** Remain objective and evidence-based. Use phrases like "considerations include" or "warrants further investigation."
6.  **Risk Assessment:** Continuously monitor the conversation for any language indicating a potential risk of harm to self or others (e.g., suicidal ideation, self-harm, threats of violence). If such a risk is detected, you MUST begin your response with the exact, non-negotiable flag: {RISK_MARKER}. Following the flag, your immediate next step should be to advise the clinician to follow standard safety protocols, before proceeding with any other analysis.

**Crucial Operating Principles:**
- **NEVER** present yourself as a medical professional.
- **ALWAYS** begin your analysis by stating it is based on the provided context.
- **ALWAYS** conclude every response with the following disclaimer, formatted exactly as below, separated by a horizontal rule:
---
***Disclaimer:*** *This is an AI-generated analysis and not a medical diagnosis. It is intended for use by qualified medical professionals as a supplementary tool. All diagnostic decisions must be based on independent professional clinical judgment.*
- **DO NOT** engage in conversations outside the scope of mental health diagnostics.
- **PRIORITIZE** safety. If any information suggests immediate risk of harm, you must use the {RISK_MARKER} at the beginning of your response and your first recommendation must be to follow standard clinical safety protocols.
"#;

/// Slot in [`SOAP_NOTE_TEMPLATE`] that receives the formatted conversation.
pub const CONVERSATION_SLOT: &str = "{CONVERSATION_HISTORY}";

pub const SOAP_NOTE_TEMPLATE: &str = r#"
Based on the following clinical conversation, generate a concise and structured clinical note in the SOAP format.

**Conversation:**
---
{CONVERSATION_HISTORY}
---

**SOAP Note Structure:**

**S (Subjective):** The patient's subjective report of their symptoms, feelings, and history as described by the clinician. Use direct quotes from the clinician's input where impactful.

**O (Objective):** Objective, observable information. In this text-based context, this section might be limited. Note any observed patterns in language, speech (if described), or behavior mentioned in the conversation. If no objective data is available, state "N/A in this context."

**A (Assessment):** A summary of the key symptoms and the AI's diagnostic analysis based on the conversation. List the primary diagnosis and any differential diagnoses considered.

**P (Plan):** A brief, actionable plan. This should include recommendations for further evaluation, therapeutic interventions, and any medication considerations discussed.

Generate the note now.
"#;

/// Shown instead of a note when generation fails.
pub const NOTE_ERROR_MESSAGE: &str = "Error: Could not generate the note. Please try again.";

/// A canned opening the clinician can start a session from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarterPrompt {
    pub title: &'static str,
    /// Pre-filled input; the clinician completes the sentence.
    pub prompt: &'static str,
}

pub const STARTER_PROMPTS: [StarterPrompt; 3] = [
    StarterPrompt {
        title: "Analyze Symptoms",
        prompt: "Analyze the following symptoms for potential diagnoses: ",
    },
    StarterPrompt {
        title: "Differential Diagnosis",
        prompt: "Provide a differential diagnosis for a patient presenting with: ",
    },
    StarterPrompt {
        title: "Review Patient History",
        prompt: "Review the patient's history and provide clinical insights: ",
    },
];

/// The system instruction with `risk_marker` as the flag the model must
/// open risky replies with.
pub fn system_instruction(risk_marker: &str) -> String {
    SYSTEM_INSTRUCTION_TEMPLATE.replace(RISK_MARKER_SLOT, risk_marker)
}
