//! Prompts for the generative-AI assist service.
//!
//! Extraction prompts ask for bare JSON; chat prompts ask for short answers.

/// Opening message of the in-app assistant.
pub const CHAT_GREETING: &str = "Hello! I'm your PillMatrix AI Assistant. I can help you with questions about your medications, dosages, side effects, and general health information. How can I help you today?";

/// User prompt for structured prescription extraction.
pub fn make_prescription_prompt(prescription_text: &str) -> String {
    format!(
        r#"You are a medical prescription parser. Extract structured information from this prescription text.

Prescription Text:
{}

Extract and return ONLY a valid JSON object with this exact structure (no markdown, no code blocks, just pure JSON):
{{
  "medications": [
    {{
      "name": "medication name",
      "dosage": "dosage with unit (e.g., 500mg, 10ml)",
      "frequency": "how often (e.g., twice daily, once daily, BD, OD)",
      "duration": "how long (e.g., 7 days, 2 weeks)"
    }}
  ],
  "diagnosis": "primary diagnosis or condition",
  "notes": "any additional instructions or notes"
}}

Rules:
1. Extract ALL medications mentioned
2. If dosage/frequency/duration is unclear, use "As directed" or "Not specified"
3. Common abbreviations: OD=once daily, BD=twice daily, TD=thrice daily
4. Return ONLY the JSON object, no other text
5. If no diagnosis found, use empty string
6. If no notes found, use empty string"#,
        prescription_text
    )
}

/// Who the assistant is answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatAudience {
    #[default]
    Patient,
    /// Doctors, pharmacists and lab staff
    Professional,
}

impl ChatAudience {
    fn topic(&self) -> &'static str {
        match self {
            Self::Patient => "medication",
            Self::Professional => "healthcare professional",
        }
    }
}

/// Chat prompt for a patient question.
pub fn make_chat_prompt(question: &str) -> String {
    make_chat_prompt_for(ChatAudience::Patient, question)
}

pub fn make_chat_prompt_for(audience: ChatAudience, question: &str) -> String {
    format!(
        "You are a helpful healthcare AI assistant for PillMatrix. Answer {} questions briefly (2-3 sentences). Always advise consulting appropriate professionals for serious concerns.\n\nQuestion: {}",
        audience.topic(),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescription_prompt() {
        let prompt = make_prescription_prompt("Amoxicillin 500mg BD");
        assert!(prompt.contains("Prescription Text:\nAmoxicillin 500mg BD\n"));
        assert!(prompt.contains(r#""medications": ["#));
        assert!(prompt.contains("OD=once daily"));
        assert!(prompt.contains(r#"use "As directed""#));
    }

    #[test]
    fn test_chat_prompt_audience() {
        let patient = make_chat_prompt("Can I take ibuprofen?");
        assert!(patient.contains("Answer medication questions briefly"));
        assert!(patient.ends_with("Question: Can I take ibuprofen?"));

        let professional =
            make_chat_prompt_for(ChatAudience::Professional, "Max paracetamol dose?");
        assert!(professional.contains("Answer healthcare professional questions"));
    }
}
