// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod assembler;
mod consultation;
mod error;
mod events;
pub mod intake;
pub mod prompts;
mod risk;
mod soap;
pub mod speech;

pub use assembler::{StreamAssembler, PLACEHOLDER};
pub use consultation::{replay_turns, Consultation, PendingResponse};
pub use error::ConsultError;
pub use events::ChatEvent;
pub use intake::{FieldError, IntakeError, PatientIntake};
pub use prompts::{system_instruction, StarterPrompt, NOTE_ERROR_MESSAGE, STARTER_PROMPTS};
pub use risk::RiskDetector;
pub use soap::{generate_soap_note, soap_prompt, MIN_NOTE_MESSAGES};
