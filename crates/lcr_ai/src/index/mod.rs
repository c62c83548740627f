use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lcr_core::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::chunking::TextChunk;
use crate::corpus::SourceTag;
use crate::embeddings::Embedder;

/// Persisted chunk record. `ordinal` is the insertion position across the
/// whole build, used as the deterministic retrieval tie-breaker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedChunk {
    pub chunk_id: String,
    pub content: String,
    pub tag: SourceTag,
    pub chunk_index: u32,
    pub ordinal: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionStatus {
    pub ready: bool,
    pub model_family: Option<String>,
    pub dims: Option<u32>,
    pub chunk_count: u32,
    pub built_at: Option<String>,
}

impl CollectionStatus {
    fn not_ready() -> Self {
        Self {
            ready: false,
            model_family: None,
            dims: None,
            chunk_count: 0,
            built_at: None,
        }
    }
}

/// Vector collection persisted under one directory.
///
/// The collection is append-only for the lifetime of a process: it is built
/// once (status written last, after vectors and chunks, so a failed build
/// never looks ready) and read-only afterwards. A ready collection is never
/// rebuilt — `build` returns the existing status untouched; delete the
/// directory to force a rebuild after source-data changes.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    root: PathBuf,
}

impl CollectionStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    /// Open the collection at `root` only if a ready one is persisted there;
    /// `None` means retrieval is unavailable until a build runs.
    pub fn load(root: PathBuf) -> Result<Option<Self>, AppError> {
        let store = Self::open(root);
        if store.status()?.ready {
            Ok(Some(store))
        } else {
            Ok(None)
        }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn status_path(&self) -> PathBuf {
        self.root.join("collection.json")
    }

    fn vectors_path(&self) -> PathBuf {
        self.root.join("vectors.json")
    }

    fn chunks_path(&self) -> PathBuf {
        self.root.join("chunks.json")
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root.as_path()).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to create collection directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }

    pub fn status(&self) -> Result<CollectionStatus, AppError> {
        let path = self.status_path();
        if !path.exists() {
            return Ok(CollectionStatus::not_ready());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to read collection status")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to decode collection status")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    fn write_json(&self, path: &Path, value: &impl Serialize, what: &str) -> Result<(), AppError> {
        self.ensure_dirs()?;
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(value).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", format!("Failed to encode {what}"))
                .with_details(e.to_string())
        })?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", format!("Failed to write {what}"))
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", format!("Failed to finalize {what} write"))
                .with_details(format!(
                    "tmp={}; dest={}; err={}",
                    tmp.display(),
                    path.display(),
                    e
                ))
        })?;
        Ok(())
    }

    pub fn read_vectors(&self) -> Result<BTreeMap<String, Vec<f32>>, AppError> {
        let path = self.vectors_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to read collection vectors")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to decode collection vectors")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    pub fn read_chunks(&self) -> Result<BTreeMap<String, IndexedChunk>, AppError> {
        let path = self.chunks_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to read collection chunks")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("KB_INDEX_BUILD_FAILED", "Failed to decode collection chunks")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Build the collection from chunks, or return the existing one.
    ///
    /// Idempotent at the collection level: a ready collection short-circuits
    /// before any embedding work (a cost tradeoff; staleness after source
    /// edits is accepted). All embeddings are computed in memory first, so an
    /// embedding failure leaves no partial collection behind.
    pub fn build(
        &self,
        chunks: &[TextChunk],
        embedder: &dyn Embedder,
        built_at: &str,
    ) -> Result<CollectionStatus, AppError> {
        let current = self.status()?;
        if current.ready {
            info!(
                path = %self.root.display(),
                chunk_count = current.chunk_count,
                "collection already exists; skipping build"
            );
            return Ok(current);
        }

        if chunks.is_empty() {
            return Err(AppError::new(
                "KB_CORPUS_EMPTY",
                "No documents loaded; refusing to build an empty collection",
            ));
        }

        let mut vectors: BTreeMap<String, Vec<f32>> = BTreeMap::new();
        let mut stored: BTreeMap<String, IndexedChunk> = BTreeMap::new();
        let mut dims: Option<u32> = None;

        for (ordinal, chunk) in chunks.iter().enumerate() {
            let chunk_id = chunk_id(chunk);
            let v = embedder.embed_document(&chunk.content).map_err(|e| {
                AppError::new("AI_EMBEDDINGS_FAILED", "Failed to embed chunk")
                    .with_details(format!("chunk_id={}; err={}", chunk_id, e))
                    .with_retryable(e.retryable)
            })?;
            let this_dims = v.len() as u32;
            match dims {
                Some(d) if d != this_dims => {
                    return Err(AppError::new(
                        "KB_INDEX_BUILD_FAILED",
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!(
                        "expected={d}; got={this_dims}; chunk_id={chunk_id}"
                    )));
                }
                Some(_) => {}
                None => dims = Some(this_dims),
            }
            if vectors.contains_key(&chunk_id) {
                // Identical content under the same tag/index; harmless, keep the first.
                warn!(chunk_id = %chunk_id, "duplicate chunk id during build");
                continue;
            }
            vectors.insert(chunk_id.clone(), v);
            stored.insert(
                chunk_id.clone(),
                IndexedChunk {
                    chunk_id,
                    content: chunk.content.clone(),
                    tag: chunk.tag,
                    chunk_index: chunk.chunk_index,
                    ordinal: ordinal as u32,
                },
            );
        }

        // Persist payloads first, status last.
        self.write_json(&self.chunks_path(), &stored, "collection chunks")?;
        self.write_json(&self.vectors_path(), &vectors, "collection vectors")?;

        let status = CollectionStatus {
            ready: true,
            model_family: Some(embedder.model_family().to_string()),
            dims,
            chunk_count: vectors.len() as u32,
            built_at: Some(built_at.to_string()),
        };
        self.write_json(&self.status_path(), &status, "collection status")?;
        info!(
            path = %self.root.display(),
            chunk_count = status.chunk_count,
            "collection built"
        );
        Ok(status)
    }
}

fn chunk_id(chunk: &TextChunk) -> String {
    let payload = format!(
        "tag={}|index={}|content={}",
        chunk.tag.as_str(),
        chunk.chunk_index,
        chunk.content
    );
    let digest = Sha256::digest(payload.as_bytes());
    hex::encode(digest)
}
