use lcr_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::Embedder;
use crate::index::{CollectionStore, IndexedChunk};

mod similarity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub chunk: IndexedChunk,
    pub score: f32,
}

/// Fresh per query; never persisted. Sorted by score descending, at most k
/// entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Similarity search over a built collection.
///
/// Explicitly constructed and passed into each pipeline invocation; callers
/// model "retrieval infrastructure absent" as `Option<&Retriever>` rather
/// than ambient global state.
pub struct Retriever<'a> {
    store: CollectionStore,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(store: CollectionStore, embedder: &'a dyn Embedder) -> Self {
        Self { store, embedder }
    }

    /// Top-k nearest chunks by cosine similarity; ties break by insertion
    /// ordinal. An absent or unbuilt collection yields an empty result, never
    /// an error — callers degrade to ungrounded generation.
    pub fn retrieve(&self, query: &str, k: u32) -> Result<RetrievalResult, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("AI_INPUT_EMPTY", "Query must not be empty"));
        }
        let k = k.max(1).min(50);

        let st = self.store.status()?;
        if !st.ready {
            debug!(path = %self.store.root().display(), "collection not ready; returning empty retrieval");
            return Ok(RetrievalResult::empty());
        }

        // Query and corpus embeddings must come from the same model family or
        // the similarity scores are meaningless.
        if st.model_family.as_deref() != Some(self.embedder.model_family()) {
            return Err(AppError::new(
                "KB_RETRIEVAL_FAILED",
                "Collection was built with a different embedding model",
            )
            .with_details(format!(
                "collection={:?}; embedder={}",
                st.model_family,
                self.embedder.model_family()
            )));
        }
        let dims = st
            .dims
            .ok_or_else(|| AppError::new("KB_RETRIEVAL_FAILED", "Collection status missing dims"))?;

        let qv = self.embedder.embed_query(q)?;
        if qv.len() as u32 != dims {
            return Err(AppError::new(
                "KB_RETRIEVAL_FAILED",
                "Query embedding dims do not match collection dims",
            )
            .with_details(format!("collection_dims={dims}; query_dims={}", qv.len())));
        }
        let qnorm = similarity::l2_norm(&qv);
        if qnorm == 0.0 {
            return Err(AppError::new(
                "KB_RETRIEVAL_FAILED",
                "Query embedding norm is zero",
            ));
        }

        let vectors = self.store.read_vectors()?;
        if vectors.is_empty() {
            return Err(AppError::new(
                "KB_RETRIEVAL_FAILED",
                "Collection is marked ready but has no vectors; rebuild the collection",
            ));
        }
        let chunks = self.store.read_chunks()?;

        let mut scored: Vec<(f32, IndexedChunk)> = Vec::new();
        for (chunk_id, v) in vectors.iter() {
            if v.len() as u32 != dims {
                return Err(AppError::new(
                    "KB_RETRIEVAL_FAILED",
                    "Collection vector dims mismatch",
                )
                .with_details(format!(
                    "chunk_id={chunk_id}; expected={dims}; got={}",
                    v.len()
                )));
            }
            let Some(chunk) = chunks.get(chunk_id) else {
                return Err(AppError::new(
                    "KB_RETRIEVAL_FAILED",
                    "Collection vector without a stored chunk",
                )
                .with_details(format!("chunk_id={chunk_id}")));
            };
            let vnorm = similarity::l2_norm(v);
            if vnorm == 0.0 {
                continue;
            }
            scored.push((similarity::cosine_similarity(&qv, v, qnorm, vnorm), chunk.clone()));
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.ordinal.cmp(&b.1.ordinal))
        });
        scored.truncate(k as usize);

        Ok(RetrievalResult {
            hits: scored
                .into_iter()
                .map(|(score, chunk)| ScoredChunk { chunk, score })
                .collect(),
        })
    }
}
