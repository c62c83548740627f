use lcr_core::domain::{GroundednessLabel, GroundednessVerdict};
use lcr_core::error::AppError;

use super::GroundednessCheck;
use crate::llm::upstage_chat::{post_chat, ChatMessage};
use crate::upstage::UpstageClient;

/// Upstage groundedness check: the evidence goes in as the user turn and the
/// answer under evaluation as the assistant turn; the model replies with a
/// categorical label.
#[derive(Debug, Clone)]
pub struct UpstageGroundednessCheck {
    client: UpstageClient,
    model: String,
}

impl UpstageGroundednessCheck {
    pub fn new(client: UpstageClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

pub(crate) fn parse_verdict(raw: &str) -> GroundednessVerdict {
    let trimmed = raw.trim();
    let label = match trimmed.to_ascii_lowercase().as_str() {
        "grounded" => GroundednessLabel::Grounded,
        "notgrounded" | "not_grounded" => GroundednessLabel::NotGrounded,
        "notsure" | "not_sure" => GroundednessLabel::Unknown,
        _ => GroundednessLabel::Unknown,
    };
    let rationale = if label == GroundednessLabel::Unknown && !trimmed.is_empty() {
        // Keep whatever the model said for operator diagnostics.
        Some(trimmed.to_string())
    } else {
        None
    };
    GroundednessVerdict { label, rationale }
}

impl GroundednessCheck for UpstageGroundednessCheck {
    fn check(&self, answer: &str, evidence: &str) -> Result<GroundednessVerdict, AppError> {
        let raw = post_chat(
            &self.client,
            &self.model,
            vec![
                ChatMessage {
                    role: "user",
                    content: evidence,
                },
                ChatMessage {
                    role: "assistant",
                    content: answer,
                },
            ],
            None,
            "AI_GROUNDEDNESS_FAILED",
        )?;
        Ok(parse_verdict(&raw))
    }
}
