use lcr_core::error::AppError;

/// Fixed-size vector embedding of text.
///
/// Corpus chunks and queries must be embedded by the same model family or
/// similarity scores are meaningless; implementations map the two purposes to
/// the family's passage/query variants.
pub trait Embedder {
    fn embed_document(&self, input: &str) -> Result<Vec<f32>, AppError>;
    fn embed_query(&self, input: &str) -> Result<Vec<f32>, AppError>;
    /// Model family identifier recorded in the collection status.
    fn model_family(&self) -> &str;
}

pub mod upstage_embed;
