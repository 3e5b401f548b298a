//! Wire types for the `generateContent` API.
//!
//! Transport is left to the host: implement [`CompletionClient`] over
//! whatever HTTP stack the app already ships.

use serde::{Deserialize, Serialize};

use crate::extraction::ExtractionResult;

/// Sampling settings sent with each request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    /// Low temperature, room for several medications.
    pub const fn prescription() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 2048,
        }
    }

    /// Conversational, a few sentences.
    pub const fn chat() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Single-turn request without a role, as used for extraction.
    pub fn from_prompt(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            generation_config,
        }
    }

    /// Single user turn, as used for chat.
    pub fn user_turn(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if it is not blank.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Sends a request to the model and returns its response.
pub trait CompletionClient {
    fn complete(
        &self,
        request: &GenerateContentRequest,
    ) -> ExtractionResult<GenerateContentResponse>;
}

impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    fn complete(
        &self,
        request: &GenerateContentRequest,
    ) -> ExtractionResult<GenerateContentResponse> {
        (**self).complete(request)
    }
}
