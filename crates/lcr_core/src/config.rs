use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Explicit pipeline configuration.
///
/// Every knob the pipeline reads lives here as a named field; nothing is read
/// from ambient environment state inside the core. The host resolves
/// credentials (config file, then environment) before constructing clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub limits: LimitConfig,
    #[serde(default)]
    pub paths: DataPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Absent key is a typed state, not an implicit None read at call time.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Embedding model family; the purpose suffix (passage/query) is applied
    /// by the embedding client.
    pub embedding_model: String,
    pub chat_model: String,
    pub reasoning_effort: String,
    pub groundedness_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitConfig {
    /// Inputs estimated above this many tokens take the split path. Tuned
    /// below the model's hard limit to leave room for retrieved context.
    pub split_threshold_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataPaths {
    pub qa_json: PathBuf,
    pub statute_json: PathBuf,
    pub clauses_csv: PathBuf,
    pub defaulter_csv: PathBuf,
    pub collection_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upstage.ai/v1/solar".to_string(),
            api_key: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_model: "solar-embedding-1-large".to_string(),
            chat_model: "solar-pro2".to_string(),
            reasoning_effort: "high".to_string(),
            groundedness_model: "groundedness-check".to_string(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            split_threshold_tokens: 2000,
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            qa_json: PathBuf::from("data/easylaw_qa.json"),
            statute_json: PathBuf::from("data/housing_lease_act_parsed.json"),
            clauses_csv: PathBuf::from("data/special_clauses.csv"),
            defaulter_csv: PathBuf::from("data/habitual_defaulters.csv"),
            collection_dir: PathBuf::from("collections/lease_kb"),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            models: ModelConfig::default(),
            retrieval: RetrievalConfig::default(),
            chunking: ChunkingConfig::default(),
            limits: LimitConfig::default(),
            paths: DataPaths::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Structural validation. Credential presence is checked separately by
    /// whoever constructs a client, so offline commands work without a key.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "chunk_overlap must be smaller than chunk_size",
            )
            .with_details(format!(
                "chunk_size={}; chunk_overlap={}",
                self.chunking.chunk_size, self.chunking.chunk_overlap
            )));
        }
        if self.chunking.chunk_size == 0 {
            return Err(AppError::new("CONFIG_INVALID", "chunk_size must be positive"));
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::new("CONFIG_INVALID", "retrieval top_k must be positive"));
        }
        if self.limits.split_threshold_tokens == 0 {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "split_threshold_tokens must be positive",
            ));
        }
        Ok(())
    }
}
