use lcr_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::upstage::UpstageClient;

/// Upstage Solar embeddings. The configured model is a family id
/// (e.g. `solar-embedding-1-large`); the API exposes `-passage` and `-query`
/// variants which must be paired for corpus and query embedding.
#[derive(Debug, Clone)]
pub struct UpstageEmbedder {
    client: UpstageClient,
    model_family: String,
}

impl UpstageEmbedder {
    pub fn new(client: UpstageClient, model_family: impl Into<String>) -> Self {
        Self {
            client,
            model_family: model_family.into(),
        }
    }

    fn embed_with_model(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        // Keep requests bounded. Chunking enforces reasonable sizes, but guard anyway.
        let input = clip_to_char_boundary(input, 12_000);

        let url = format!("{}/embeddings", self.client.base_url());
        let req = EmbeddingsRequest { model, input };
        let resp = ureq::post(&url)
            .set("Authorization", &self.client.bearer())
            .timeout(std::time::Duration::from_secs(30))
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to encode embeddings request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: EmbeddingsResponse = r.into_json().map_err(|e| {
                    AppError::new("AI_EMBEDDINGS_FAILED", "Failed to decode embeddings response")
                        .with_details(e.to_string())
                })?;
                let embedding = v
                    .data
                    .into_iter()
                    .next()
                    .map(|d| d.embedding)
                    .unwrap_or_default();
                if embedding.is_empty() {
                    return Err(AppError::new(
                        "AI_EMBEDDINGS_FAILED",
                        "Embeddings response was empty",
                    ));
                }
                Ok(embedding)
            }
            Ok(r) => Err(
                AppError::new("AI_EMBEDDINGS_FAILED", "Embeddings request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to call embeddings endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

fn clip_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl Embedder for UpstageEmbedder {
    fn embed_document(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let model = format!("{}-passage", self.model_family);
        self.embed_with_model(&model, input)
    }

    fn embed_query(&self, input: &str) -> Result<Vec<f32>, AppError> {
        let model = format!("{}-query", self.model_family);
        self.embed_with_model(&model, input)
    }

    fn model_family(&self) -> &str {
        &self.model_family
    }
}
