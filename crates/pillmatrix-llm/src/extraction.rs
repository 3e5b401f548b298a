//! Prescription extraction from model output, with heuristic fallback.

use pillmatrix_core::models::{ParseResult, ParsedMedication, DEFAULT_DURATION, DEFAULT_FREQUENCY};
use pillmatrix_core::parser::MedicationParser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::{CompletionClient, GenerateContentRequest, GenerationConfig};
use crate::prompts::make_prescription_prompt;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("No medications in model response")]
    NoMedications,

    #[error("Completion client error: {0}")]
    Client(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Prescription JSON as the model returns it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelOutput {
    #[serde(default)]
    pub medications: Vec<ModelMedication>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One medication as the model returns it. Any field may be missing or null.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMedication {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl ModelMedication {
    /// `None` when the model gave no name.
    fn into_parsed(self) -> Option<ParsedMedication> {
        let name = trimmed(self.name)?;
        Some(ParsedMedication {
            name,
            dosage: trimmed(self.dosage).unwrap_or_default(),
            frequency: trimmed(self.frequency).unwrap_or_else(|| DEFAULT_FREQUENCY.to_string()),
            duration: trimmed(self.duration).unwrap_or_else(|| DEFAULT_DURATION.to_string()),
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strip markdown code fences the model wraps around JSON.
pub fn clean_model_response(raw: &str) -> String {
    let trimmed = raw.trim();
    let cleaned = if trimmed.starts_with("```json") {
        trimmed.replace("```json", "").replace("```", "")
    } else if trimmed.starts_with("```") {
        trimmed.replace("```", "")
    } else {
        trimmed.to_string()
    };
    cleaned.trim().to_string()
}

/// Parse model text into a [`ParseResult`].
pub fn parse_prescription_response(raw: &str) -> ExtractionResult<ParseResult> {
    if raw.trim().is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }
    let cleaned = clean_model_response(raw);

    // Models sometimes add a sentence around the JSON
    let json_start = cleaned.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = cleaned.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(ExtractionError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let output: ModelOutput = serde_json::from_str(&cleaned[json_start..=json_end])?;

    let medications: Vec<ParsedMedication> = output
        .medications
        .into_iter()
        .filter_map(ModelMedication::into_parsed)
        .collect();
    if medications.is_empty() {
        return Err(ExtractionError::NoMedications);
    }

    Ok(ParseResult {
        medications,
        diagnosis: trimmed(output.diagnosis),
        notes: trimmed(output.notes),
    })
}

/// Turns prescription text into a [`ParseResult`].
pub trait PrescriptionExtractor {
    fn extract(&self, text: &str) -> ExtractionResult<ParseResult>;

    /// Reported as the source of a successful extraction.
    fn source(&self) -> ExtractionSource;
}

/// Wraps the line parser. Never fails.
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtractor {
    parser: MedicationParser,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(parser: MedicationParser) -> Self {
        Self { parser }
    }
}

impl PrescriptionExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> ExtractionResult<ParseResult> {
        Ok(self.parser.parse(text))
    }

    fn source(&self) -> ExtractionSource {
        ExtractionSource::Heuristic
    }
}

/// Asks the model for structured JSON.
pub struct ModelExtractor<C> {
    client: C,
    config: GenerationConfig,
}

impl<C: CompletionClient> ModelExtractor<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, GenerationConfig::prescription())
    }

    pub fn with_config(client: C, config: GenerationConfig) -> Self {
        Self { client, config }
    }
}

impl<C: CompletionClient> PrescriptionExtractor for ModelExtractor<C> {
    fn extract(&self, text: &str) -> ExtractionResult<ParseResult> {
        let request =
            GenerateContentRequest::from_prompt(make_prescription_prompt(text), self.config);
        let response = self.client.complete(&request)?;
        let answer = response.first_text().ok_or(ExtractionError::EmptyResponse)?;
        parse_prescription_response(answer)
    }

    fn source(&self) -> ExtractionSource {
        ExtractionSource::Model
    }
}

/// Which path produced an [`Extraction`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Model,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub result: ParseResult,
    pub source: ExtractionSource,
}

/// Try `primary`, then the line parser when it errors or finds nothing.
pub fn extract_with_fallback<E: PrescriptionExtractor + ?Sized>(
    primary: &E,
    fallback: &MedicationParser,
    text: &str,
) -> Extraction {
    match primary.extract(text) {
        Ok(result) if !result.medications.is_empty() => {
            let source = primary.source();
            tracing::info!(
                medications = result.medications.len(),
                source = ?source,
                "Prescription extracted"
            );
            Extraction { result, source }
        }
        Ok(_) => {
            tracing::warn!("Extractor found no medications, falling back to heuristic parser");
            heuristic(fallback, text)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Extraction failed, falling back to heuristic parser");
            heuristic(fallback, text)
        }
    }
}

fn heuristic(parser: &MedicationParser, text: &str) -> Extraction {
    Extraction {
        result: parser.parse(text),
        source: ExtractionSource::Heuristic,
    }
}
