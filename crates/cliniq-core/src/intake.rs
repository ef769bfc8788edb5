use thiserror::Error;

/// Values offered for the gender field.  Free text is accepted too.
pub const GENDER_OPTIONS: [&str; 4] = ["Male", "Female", "Non-binary", "Prefer not to say"];

/// A single invalid intake field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Patient Identifier is required.")]
    MissingIdentifier,
    #[error("Age must be a positive number.")]
    InvalidAge,
    #[error("Chief Complaint is required.")]
    MissingChiefComplaint,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("patient record is incomplete: {}", join(.0))]
pub struct IntakeError(pub Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

/// New-patient form.  Every field is raw text as entered; empty means
/// "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientIntake {
    pub identifier: String,
    pub age: String,
    pub gender: String,
    pub chief_complaint: String,
    pub medical_history: String,
    pub current_medications: String,
    pub family_history: String,
}

impl PatientIntake {
    /// All field problems, in form order.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.identifier.trim().is_empty() {
            errors.push(FieldError::MissingIdentifier);
        }
        if !self.age.is_empty() && !is_positive_integer(&self.age) {
            errors.push(FieldError::InvalidAge);
        }
        if self.chief_complaint.trim().is_empty() {
            errors.push(FieldError::MissingChiefComplaint);
        }
        errors
    }

    /// The analysis request sent as the clinician's message.  Only fields
    /// with a value appear.
    pub fn to_prompt(&self) -> Result<String, IntakeError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(IntakeError(errors));
        }

        let mut out = String::from("New Patient Record Analysis:\n");
        for (label, value) in [
            ("Identifier", &self.identifier),
            ("Age", &self.age),
            ("Gender", &self.gender),
        ] {
            if !value.is_empty() {
                out.push_str(&format!("- {label}: {value}\n"));
            }
        }
        for (label, value) in [
            ("Chief Complaint", &self.chief_complaint),
            ("Medical History", &self.medical_history),
            ("Current Medications", &self.current_medications),
            ("Family History", &self.family_history),
        ] {
            if !value.is_empty() {
                out.push_str(&format!("\n**{label}:**\n{value}\n"));
            }
        }
        out.push_str("\nPlease analyze the provided patient information.");
        Ok(out)
    }
}

/// `"42"`, `" 42 "` and `"42.0"` pass; `"0"`, `"-3"`, `"4.5"`, `"abc"` fail.
fn is_positive_integer(raw: &str) -> bool {
    match raw.trim().parse::<f64>() {
        Ok(n) => n.is_finite() && n.fract() == 0.0 && n > 0.0,
        Err(_) => false,
    }
}
