//! In-app health assistant.
//!
//! Answers come from the model when it responds, otherwise from a fixed
//! keyword table so the chat never goes silent.

use serde::{Deserialize, Serialize};

use crate::generation::{CompletionClient, GenerateContentRequest, GenerationConfig};
use crate::prompts::{make_chat_prompt_for, ChatAudience, CHAT_GREETING};

/// Reply when no keyword matches.
pub const DEFAULT_REPLY: &str = "That's a great question about your health! For detailed medical advice about your specific medications or health conditions, I recommend consulting with your doctor or pharmacist. They can provide personalized guidance based on your medical history. In the meantime, you can check your medication leaflet for more information.";

/// Keyword alternatives and their canned reply, checked in order.
pub const LOCAL_REPLIES: &[(&[&str], &str)] = &[
    (
        &["metformin"],
        "Metformin is a common medication for managing type 2 diabetes. It helps control blood sugar levels by reducing glucose production in the liver. Take it as prescribed, usually with meals to minimize stomach upset. Common side effects include mild nausea or diarrhea. Always consult your doctor before making any changes.",
    ),
    (
        &["lisinopril"],
        "Lisinopril is an ACE inhibitor used to treat high blood pressure and heart failure. It works by relaxing blood vessels to improve blood flow. Take it exactly as prescribed, usually once daily. Common side effects include dry cough and dizziness. Never stop taking it without consulting your doctor.",
    ),
    (
        &["aspirin"],
        "Aspirin is commonly used for pain relief, fever reduction, and blood thinning. It works by reducing inflammation and preventing blood clots. Take with food or water to prevent stomach upset. Do not exceed recommended doses. Consult your doctor if you have bleeding concerns.",
    ),
    (
        &["ibuprofen"],
        "Ibuprofen is a nonsteroidal anti-inflammatory drug (NSAID) used for pain and inflammation. It works by reducing prostaglandins that cause pain and swelling. Take with food to minimize stomach irritation. Do not use long-term without medical supervision. Consult your doctor if you have kidney or heart issues.",
    ),
    (
        &["side effect"],
        "Side effects vary by medication and individual. Common ones are usually mild and temporary. Serious side effects require immediate medical attention. Always read your medication leaflet and report any unusual symptoms to your doctor.",
    ),
    (
        &["dose", "dosage"],
        "Never change your medication dosage without consulting your doctor. Your dosage is prescribed based on your specific health condition, age, and other medications. If you have concerns about your current dose, contact your healthcare provider immediately.",
    ),
    (
        &["reminder", "when to take"],
        "You can set medication reminders in the PillMatrix app. Most medications work best when taken at the same time each day. Check your prescription details for the recommended timing. Enable notifications to get smart reminders.",
    ),
    (
        &["allergy", "allergic"],
        "If you experience an allergic reaction (rash, swelling, difficulty breathing), seek immediate medical attention. Always inform your healthcare providers about your allergies. The PillMatrix app helps track your allergies to prevent dangerous interactions.",
    ),
    (
        &["interaction", "interact"],
        "Drug interactions can be serious. PillMatrix checks for interactions between your medications. Always inform your doctor about all medications, supplements, and herbal products you take. Never start new medications without consulting your doctor.",
    ),
    (
        &["pregnancy", "pregnant"],
        "Many medications are not safe during pregnancy. If you are pregnant or planning to become pregnant, consult your doctor before taking any medication. Your doctor can recommend safe alternatives.",
    ),
    (
        &["breastfeed", "nursing"],
        "Some medications pass into breast milk and may affect your baby. If you are breastfeeding, consult your doctor before taking any medication. Your doctor can recommend safe alternatives.",
    ),
];

/// Canned reply for the first matching keyword row.
pub fn local_reply(input: &str) -> &'static str {
    let lower = input.to_lowercase();
    LOCAL_REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Where an assistant message came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Model,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    /// RFC 3339
    pub timestamp: String,
    /// Set on assistant messages only
    pub source: Option<ReplySource>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>, source: Option<ReplySource>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            source,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content, None)
    }

    /// The assistant's opening message.
    pub fn greeting() -> Self {
        Self::new(ChatRole::Assistant, CHAT_GREETING, Some(ReplySource::Local))
    }
}

/// Chat assistant backed by a completion client.
pub struct ChatAssistant<C> {
    client: C,
    config: GenerationConfig,
    audience: ChatAudience,
}

impl<C: CompletionClient> ChatAssistant<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: GenerationConfig::chat(),
            audience: ChatAudience::default(),
        }
    }

    pub fn with_audience(mut self, audience: ChatAudience) -> Self {
        self.audience = audience;
        self
    }

    /// Answer a question; falls back to [`local_reply`] on any model failure.
    pub fn reply(&self, question: &str) -> ChatMessage {
        let prompt = make_chat_prompt_for(self.audience, question);
        let request = GenerateContentRequest::user_turn(prompt, self.config);

        let answer = match self.client.complete(&request) {
            Ok(response) => response.first_text().map(|t| t.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Chat completion failed");
                None
            }
        };

        match answer {
            Some(text) => ChatMessage::new(ChatRole::Assistant, text, Some(ReplySource::Model)),
            None => {
                tracing::debug!("Answering from local replies");
                ChatMessage::new(
                    ChatRole::Assistant,
                    local_reply(question),
                    Some(ReplySource::Local),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionError, ExtractionResult};
    use crate::generation::{Candidate, Content, GenerateContentResponse, Part};

    struct FixedClient(Option<&'static str>);

    impl CompletionClient for FixedClient {
        fn complete(
            &self,
            request: &GenerateContentRequest,
        ) -> ExtractionResult<GenerateContentResponse> {
            assert_eq!(request.generation_config, GenerationConfig::chat());
            match self.0 {
                Some(text) => Ok(GenerateContentResponse {
                    candidates: vec![Candidate {
                        content: Some(Content {
                            role: Some("model".into()),
                            parts: vec![Part { text: text.into() }],
                        }),
                        finish_reason: None,
                    }],
                }),
                None => Err(ExtractionError::Client("offline".into())),
            }
        }
    }

    #[test]
    fn test_local_reply_keywords() {
        assert!(local_reply("What is METFORMIN for?").starts_with("Metformin is"));
        assert!(local_reply("Is this dosage right?")
            .starts_with("Never change your medication dosage"));
        assert!(local_reply("Can I take it while pregnant?")
            .starts_with("Many medications are not safe"));
        assert!(local_reply("I am nursing my baby").starts_with("Some medications pass"));
        assert!(local_reply("any side effects?").starts_with("Side effects vary"));
        assert_eq!(local_reply("Hello"), DEFAULT_REPLY);
    }

    #[test]
    fn test_local_reply_first_row_wins() {
        // Matches both metformin and side effect rows
        assert!(local_reply("metformin side effects").starts_with("Metformin is"));
    }

    #[test]
    fn test_reply_from_model() {
        let assistant = ChatAssistant::new(FixedClient(Some("  Take it with food.  ")));
        let message = assistant.reply("How do I take aspirin?");

        assert_eq!(message.role, ChatRole::Assistant);
        assert_eq!(message.content, "Take it with food.");
        assert_eq!(message.source, Some(ReplySource::Model));
    }

    #[test]
    fn test_reply_falls_back_to_local() {
        let assistant = ChatAssistant::new(FixedClient(None));
        let message = assistant.reply("Any drug interactions with lisinopril?");

        // Row order puts lisinopril ahead of interactions
        assert!(message.content.starts_with("Lisinopril is"));
        assert_eq!(message.source, Some(ReplySource::Local));

        let blank = ChatAssistant::new(FixedClient(Some("   ")))
            .with_audience(ChatAudience::Professional)
            .reply("allergic reaction?");
        assert!(blank.content.starts_with("If you experience an allergic reaction"));
    }

    #[test]
    fn test_messages() {
        let greeting = ChatMessage::greeting();
        assert_eq!(greeting.content, CHAT_GREETING);

        let user = ChatMessage::user("Hi");
        assert_eq!(user.role, ChatRole::User);
        assert!(user.source.is_none());
        assert_ne!(user.id, greeting.id);
    }
}
