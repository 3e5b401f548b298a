//! Prescription models: drafting from parsed text and status lifecycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ParseResult;

/// Instructions attached to every medication copied from a parse.
pub const DEFAULT_INSTRUCTIONS: &str = "Take as prescribed";

/// Characters of source text quoted in generated notes.
const SOURCE_EXCERPT_CHARS: usize = 200;

/// Prescription errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrescriptionError {
    #[error("At least one medication with a name is required")]
    MissingMedication,

    #[error("A diagnosis is required")]
    MissingDiagnosis,

    #[error("Cannot move prescription from {from:?} to {to:?}")]
    InvalidTransition {
        from: PrescriptionStatus,
        to: PrescriptionStatus,
    },
}

pub type PrescriptionResult<T> = Result<T, PrescriptionError>;

/// A medication line on a stored prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrescribedMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: Option<String>,
}

/// Lifecycle status of a prescription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    /// Written, not yet handled by a pharmacist
    Pending,
    /// Filled by a pharmacist
    Filled,
    /// Refilled after an earlier fill
    Refilled,
    /// Handed to the patient
    Delivered,
    /// Withdrawn
    Cancelled,
}

impl PrescriptionStatus {
    /// Whether this prescription still sits in the pharmacist's queue.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Filled | Self::Refilled)
    }

    /// Check if moving to `next` is allowed.
    pub fn can_transition_to(&self, next: PrescriptionStatus) -> bool {
        use PrescriptionStatus::*;
        match (self, next) {
            (Pending, Filled | Delivered | Cancelled) => true,
            (Filled, Refilled | Delivered | Cancelled) => true,
            (Refilled, Refilled | Delivered | Cancelled) => true,
            _ => false,
        }
    }
}

/// Someone acting on a prescription (doctor, patient or pharmacist).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A stored prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub pharmacist_id: Option<String>,
    pub pharmacist_name: Option<String>,
    pub appointment_id: Option<String>,
    pub medications: Vec<PrescribedMedication>,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub status: PrescriptionStatus,
    /// RFC 3339
    pub created_at: String,
    pub filled_at: Option<String>,
    pub delivered_at: Option<String>,
}

impl Prescription {
    /// Move to a new status, stamping the acting pharmacist and timestamps.
    pub fn transition(
        &mut self,
        next: PrescriptionStatus,
        pharmacist: &Participant,
    ) -> PrescriptionResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(PrescriptionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        let now = chrono::Utc::now().to_rfc3339();
        match next {
            PrescriptionStatus::Filled | PrescriptionStatus::Refilled => {
                self.filled_at = Some(now);
            }
            PrescriptionStatus::Delivered => {
                self.delivered_at = Some(now);
            }
            PrescriptionStatus::Pending | PrescriptionStatus::Cancelled => {}
        }

        self.pharmacist_id = Some(pharmacist.id.clone());
        self.pharmacist_name = Some(pharmacist.name.clone());
        tracing::info!(
            prescription_id = %self.id,
            from = ?self.status,
            to = ?next,
            "Prescription status changed"
        );
        self.status = next;
        Ok(())
    }
}

/// Editable prescription assembled from a parse, before it is saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PrescriptionDraft {
    pub appointment_id: Option<String>,
    pub medications: Vec<PrescribedMedication>,
    pub diagnosis: String,
    pub notes: Option<String>,
}

impl PrescriptionDraft {
    /// Build a draft from parser (or model) output.
    ///
    /// When the parse found no notes, the notes quote the start of the
    /// recognized text so the digitized origin stays visible.
    pub fn from_parse_result(result: &ParseResult, source_text: &str) -> Self {
        let medications = result
            .editable_medications()
            .into_iter()
            .map(|m| PrescribedMedication {
                name: m.name,
                dosage: m.dosage,
                frequency: m.frequency,
                duration: m.duration,
                instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
            })
            .collect();

        let notes = match &result.notes {
            Some(notes) if !notes.is_empty() => notes.clone(),
            _ => {
                let excerpt: String = source_text.chars().take(SOURCE_EXCERPT_CHARS).collect();
                format!(
                    "Prescription digitized from uploaded image. Original text: {}...",
                    excerpt
                )
            }
        };

        Self {
            appointment_id: None,
            medications,
            diagnosis: result.diagnosis.clone().unwrap_or_default(),
            notes: Some(notes),
        }
    }

    /// Validate and turn the draft into a pending prescription.
    pub fn into_prescription(
        self,
        patient: &Participant,
        doctor: &Participant,
    ) -> PrescriptionResult<Prescription> {
        match self.medications.first() {
            Some(first) if !first.name.trim().is_empty() => {}
            _ => return Err(PrescriptionError::MissingMedication),
        }
        if self.diagnosis.trim().is_empty() {
            return Err(PrescriptionError::MissingDiagnosis);
        }

        Ok(Prescription {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            doctor_id: doctor.id.clone(),
            doctor_name: doctor.name.clone(),
            pharmacist_id: None,
            pharmacist_name: None,
            appointment_id: self.appointment_id,
            medications: self.medications,
            diagnosis: self.diagnosis,
            notes: self.notes,
            status: PrescriptionStatus::Pending,
            created_at: chrono::Utc::now().to_rfc3339(),
            filled_at: None,
            delivered_at: None,
        })
    }
}
