//! Prescription text parser.
//!
//! Turns OCR text into medication candidates with a single, order-preserving
//! pass over its lines:
//! - Diagnosis capture (first hit wins, value may sit on the next line)
//! - Notes accumulation (every matching line contributes)
//! - Medication line filtering and field extraction
//! - Continuation lines (`BD`, `7 days`) that complete the previous medication
//!
//! The parser never fails. Unrecognized fields fall back to
//! [`DEFAULT_FREQUENCY`] and [`DEFAULT_DURATION`].

mod extract;
mod tables;

pub use extract::*;
pub use tables::{
    DurationOutput, FrequencyRule, DIAGNOSIS_KEYWORDS, FORM_KEYWORDS, FREQUENCY_TABLE,
    MIN_LINE_LEN, NOTES_KEYWORDS, SKIP_KEYWORDS,
};

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ParseResult, ParsedMedication, DEFAULT_DURATION, DEFAULT_FREQUENCY};
use tables::{word_pattern, DEFAULT_FREQUENCY_RULES, NUMERIC_DOSAGE};

/// Parser configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keyword must not be empty")]
    EmptyKeyword,

    #[error("Invalid keyword {keyword:?}: {source}")]
    InvalidKeyword {
        keyword: String,
        #[source]
        source: regex::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Extra frequency keyword with its expansion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrequencyKeyword {
    pub keyword: String,
    pub expansion: String,
}

/// Tunable keyword tables.
///
/// Extra frequencies are checked after the canonical table, never before it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    pub min_line_len: usize,
    pub form_keywords: Vec<String>,
    pub skip_keywords: Vec<String>,
    pub diagnosis_keywords: Vec<String>,
    pub notes_keywords: Vec<String>,
    pub extra_frequencies: Vec<FrequencyKeyword>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_line_len: MIN_LINE_LEN,
            form_keywords: owned(FORM_KEYWORDS),
            skip_keywords: owned(SKIP_KEYWORDS),
            diagnosis_keywords: owned(DIAGNOSIS_KEYWORDS),
            notes_keywords: owned(NOTES_KEYWORDS),
            extra_frequencies: Vec::new(),
        }
    }
}

impl ParserConfig {
    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Medication being assembled; fields remember whether they were defaulted.
#[derive(Debug, Clone)]
struct MedicationDraft {
    name: String,
    dosage: String,
    frequency: Extracted<String>,
    duration: Extracted<String>,
}

impl MedicationDraft {
    fn finish(self) -> ParsedMedication {
        ParsedMedication {
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency.or_sentinel(DEFAULT_FREQUENCY),
            duration: self.duration.or_sentinel(DEFAULT_DURATION),
        }
    }
}

/// Line-oriented parser for OCR prescription text.
#[derive(Debug, Clone)]
pub struct MedicationParser {
    min_line_len: usize,
    form_keywords: Vec<String>,
    skip_keywords: Vec<String>,
    diagnosis_keywords: Vec<String>,
    notes_keywords: Vec<String>,
    frequency_rules: Vec<FrequencyRule>,
}

impl Default for MedicationParser {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_PARSER: LazyLock<MedicationParser> = LazyLock::new(MedicationParser::new);

/// Parse with the default tables.
pub fn parse_medications(text: &str) -> ParseResult {
    DEFAULT_PARSER.parse(text)
}

impl MedicationParser {
    /// Create a parser with the default tables.
    pub fn new() -> Self {
        let config = ParserConfig::default();
        Self {
            min_line_len: config.min_line_len,
            form_keywords: config.form_keywords,
            skip_keywords: config.skip_keywords,
            diagnosis_keywords: config.diagnosis_keywords,
            notes_keywords: config.notes_keywords,
            frequency_rules: DEFAULT_FREQUENCY_RULES.clone(),
        }
    }

    /// Create a parser from a configuration.
    pub fn with_config(config: ParserConfig) -> ConfigResult<Self> {
        let mut parser = Self {
            min_line_len: config.min_line_len,
            form_keywords: lower(config.form_keywords),
            skip_keywords: lower(config.skip_keywords),
            diagnosis_keywords: lower(config.diagnosis_keywords),
            notes_keywords: lower(config.notes_keywords),
            frequency_rules: DEFAULT_FREQUENCY_RULES.clone(),
        };
        for extra in &config.extra_frequencies {
            parser.add_frequency(&extra.keyword, &extra.expansion)?;
        }
        Ok(parser)
    }

    /// Append a frequency keyword after all existing ones.
    pub fn add_frequency(&mut self, keyword: &str, expansion: &str) -> ConfigResult<()> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }
        let pattern = word_pattern(keyword).map_err(|source| ConfigError::InvalidKeyword {
            keyword: keyword.to_string(),
            source,
        })?;
        self.frequency_rules.push(FrequencyRule {
            keyword: keyword.to_lowercase(),
            pattern,
            expansion: expansion.to_string(),
        });
        Ok(())
    }

    /// Frequency rules in evaluation order.
    pub fn frequency_rules(&self) -> &[FrequencyRule] {
        &self.frequency_rules
    }

    /// Parse a block of prescription text.
    pub fn parse(&self, text: &str) -> ParseResult {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let mut drafts: Vec<MedicationDraft> = Vec::new();
        let mut diagnosis: Option<String> = None;
        let mut notes = String::new();
        // The last draft may still take frequency/duration from following lines
        let mut chain_open = false;

        for (index, line) in lines.iter().enumerate() {
            let lower = line.to_lowercase();

            let is_diagnosis = self.is_diagnosis_line(&lower);
            if is_diagnosis && diagnosis.is_none() {
                let candidate = after_first_colon(line)
                    .filter(|s| !s.is_empty())
                    .or_else(|| lines.get(index + 1).copied())
                    .filter(|s| !s.is_empty());
                if let Some(found) = candidate {
                    tracing::debug!(diagnosis = found, "Found diagnosis");
                    diagnosis = Some(found.to_string());
                }
            }

            let is_notes = self.notes_keywords.iter().any(|k| lower.contains(k.as_str()));
            if is_notes {
                if let Some(note) = after_first_colon(line).filter(|s| !s.is_empty()) {
                    if !notes.is_empty() {
                        notes.push(' ');
                    }
                    notes.push_str(note);
                }
            }

            if is_diagnosis || self.skip_keywords.iter().any(|k| lower.contains(k.as_str())) {
                chain_open = false;
                continue;
            }

            if !self.is_medication_line(line, &lower) {
                if is_notes {
                    chain_open = false;
                } else if chain_open {
                    if let Some(last) = drafts.last_mut() {
                        self.continue_draft(last, line, &lower);
                    }
                }
                continue;
            }

            match self.extract_draft(line, &lower) {
                Some(draft) => {
                    drafts.push(draft);
                    chain_open = true;
                }
                // A dropped candidate (`Morning`, `At night`) may still complete
                // the previous medication; otherwise it closes the chain.
                None => {
                    chain_open = chain_open
                        && !is_notes
                        && drafts
                            .last_mut()
                            .is_some_and(|last| self.continue_draft(last, line, &lower));
                }
            }
        }

        let medications: Vec<ParsedMedication> = drafts
            .into_iter()
            .map(MedicationDraft::finish)
            .inspect(|med| {
                tracing::debug!(
                    name = %med.name,
                    dosage = %med.dosage,
                    frequency = %med.frequency,
                    duration = %med.duration,
                    "Parsed medication"
                );
            })
            .collect();

        if medications.is_empty() && !lines.is_empty() {
            tracing::warn!(lines = lines.len(), "No medications recognized in prescription text");
        }

        ParseResult {
            medications,
            diagnosis,
            notes: if notes.is_empty() { None } else { Some(notes) },
        }
    }

    fn is_diagnosis_line(&self, lower: &str) -> bool {
        self.diagnosis_keywords
            .iter()
            .any(|k| lower.contains(&format!("{}:", k)) || lower.starts_with(k.as_str()))
    }

    /// Long enough, and mentions a unit/form keyword or a numeric dosage.
    fn is_medication_line(&self, line: &str, lower: &str) -> bool {
        if line.chars().count() < self.min_line_len {
            return false;
        }
        self.form_keywords.iter().any(|k| lower.contains(k.as_str()))
            || NUMERIC_DOSAGE.is_match(line)
    }

    /// Returns `None` unless both name and dosage were found.
    fn extract_draft(&self, line: &str, lower: &str) -> Option<MedicationDraft> {
        let cleaned = clean_line(line);
        let name = extract_name(&cleaned);
        let dosage = extract_dosage(line);

        if name.is_empty() || dosage.is_empty() {
            tracing::debug!(line, "Dropped medication line without name and dosage");
            return None;
        }

        Some(MedicationDraft {
            name,
            dosage,
            frequency: match_frequency(&self.frequency_rules, lower),
            duration: match_duration(line),
        })
    }

    /// Fill still-defaulted fields of the previous medication.
    ///
    /// Returns whether any field was filled.
    fn continue_draft(&self, draft: &mut MedicationDraft, line: &str, lower: &str) -> bool {
        let mut filled = false;
        if draft.frequency.is_defaulted() {
            draft.frequency = match_frequency(&self.frequency_rules, lower);
            filled |= !draft.frequency.is_defaulted();
        }
        if draft.duration.is_defaulted() {
            draft.duration = match_duration(line);
            filled |= !draft.duration.is_defaulted();
        }
        filled
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lower(words: Vec<String>) -> Vec<String> {
    words.into_iter().map(|w| w.to_lowercase()).collect()
}

/// Trimmed text after the first colon, if the line has one.
fn after_first_colon(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, rest)| rest.trim())
}
