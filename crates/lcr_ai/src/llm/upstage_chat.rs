use lcr_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::ChatModel;
use crate::upstage::UpstageClient;

#[derive(Debug, Clone)]
pub struct UpstageChatModel {
    client: UpstageClient,
    model: String,
    reasoning_effort: String,
}

impl UpstageChatModel {
    pub fn new(
        client: UpstageClient,
        model: impl Into<String>,
        reasoning_effort: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            reasoning_effort: reasoning_effort.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: String,
}

pub(crate) fn post_chat(
    client: &UpstageClient,
    model: &str,
    messages: Vec<ChatMessage<'_>>,
    reasoning_effort: Option<&str>,
    error_code: &str,
) -> Result<String, AppError> {
    let url = format!("{}/chat/completions", client.base_url());
    let req = ChatRequest {
        model,
        messages,
        reasoning_effort,
    };

    let resp = ureq::post(&url)
        .set("Authorization", &client.bearer())
        .timeout(std::time::Duration::from_secs(120))
        .send_json(serde_json::to_value(req).map_err(|e| {
            AppError::new(error_code, "Failed to encode chat request").with_details(e.to_string())
        })?);

    match resp {
        Ok(r) if r.status() == 200 => {
            let v: ChatResponse = r.into_json().map_err(|e| {
                AppError::new(error_code, "Failed to decode chat response")
                    .with_details(e.to_string())
            })?;
            let content = v
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default();
            if content.trim().is_empty() {
                return Err(AppError::new(error_code, "Chat completion was empty"));
            }
            Ok(content)
        }
        Ok(r) => Err(AppError::new(error_code, "Chat request failed")
            .with_details(format!("status={}", r.status()))),
        Err(e) => Err(AppError::new(error_code, "Failed to call chat endpoint")
            .with_details(e.to_string())
            .with_retryable(true)),
    }
}

impl ChatModel for UpstageChatModel {
    fn complete(&self, prompt: &str) -> Result<String, AppError> {
        post_chat(
            &self.client,
            &self.model,
            vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            Some(self.reasoning_effort.as_str()),
            "AI_GENERATION_FAILED",
        )
    }
}
