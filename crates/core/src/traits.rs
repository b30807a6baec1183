use crate::{EmbeddingError, GenerationError, GenerationRequest, IndexError, Neighbor};
use async_trait::async_trait;

/// Text to fixed-dimension vectors. One vector per input, in input order,
/// or an error for the whole batch.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Read-only k-nearest-neighbour structure built once over a fixed vector set.
pub trait VectorIndex: Sized {
    fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError>;

    /// Closest first, ties broken by lower id. `k` is clamped to `len()`.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;

    fn len(&self) -> usize;

    fn dimensions(&self) -> usize;

    fn vector(&self, id: usize) -> Option<&[f32]>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
