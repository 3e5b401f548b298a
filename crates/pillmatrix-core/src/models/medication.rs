//! Parsed medication models produced by the prescription text parser.

use serde::{Deserialize, Serialize};

/// Frequency used when no keyword in the line is recognized.
pub const DEFAULT_FREQUENCY: &str = "As directed";

/// Duration used when no duration pattern in the line is recognized.
pub const DEFAULT_DURATION: &str = "7 days";

/// One medication candidate extracted from prescription text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ParsedMedication {
    /// Apparent drug name (e.g., "Amoxicillin")
    pub name: String,
    /// Amount plus unit as written (e.g., "500mg", "250mg/5ml")
    pub dosage: String,
    /// Canonical frequency phrase or [`DEFAULT_FREQUENCY`]
    pub frequency: String,
    /// Normalized duration phrase or [`DEFAULT_DURATION`]
    pub duration: String,
}

impl ParsedMedication {
    /// Blank row for manual entry.
    pub fn blank() -> Self {
        Self::default()
    }

    /// Frequency equals the fallback sentinel and should be reviewed.
    pub fn uses_default_frequency(&self) -> bool {
        self.frequency == DEFAULT_FREQUENCY
    }

    /// Duration equals the fallback sentinel and should be reviewed.
    ///
    /// A prescription that literally says "7 days" is indistinguishable from
    /// the fallback here.
    pub fn uses_default_duration(&self) -> bool {
        self.duration == DEFAULT_DURATION
    }

    /// Name and dosage are both present.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.dosage.is_empty()
    }
}

/// Full output of parsing one block of prescription text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ParseResult {
    /// Medications in order of appearance
    pub medications: Vec<ParsedMedication>,
    /// First diagnosis found
    pub diagnosis: Option<String>,
    /// All note/instruction fragments joined by a single space
    pub notes: Option<String>,
}

impl ParseResult {
    /// Check if nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty() && self.diagnosis.is_none() && self.notes.is_none()
    }

    /// Medications for an editable form.
    ///
    /// The parser itself returns an empty list when nothing was recognized;
    /// forms need one blank row to type into, so it is substituted here.
    pub fn editable_medications(&self) -> Vec<ParsedMedication> {
        if self.medications.is_empty() {
            vec![ParsedMedication::blank()]
        } else {
            self.medications.clone()
        }
    }

    /// Number of entries carrying at least one fallback value.
    pub fn review_count(&self) -> usize {
        self.medications
            .iter()
            .filter(|m| m.uses_default_frequency() || m.uses_default_duration())
            .count()
    }
}
