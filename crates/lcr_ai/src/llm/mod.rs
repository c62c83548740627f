use lcr_core::error::AppError;

/// One-shot text generation. A single blocking call per invocation; failures
/// propagate to the caller, which owns fallback policy.
pub trait ChatModel {
    fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

pub mod upstage_chat;
