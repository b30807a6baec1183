use crate::embeddings::validate_batch;
use crate::traits::{Embedder, VectorIndex};
use crate::{Chunk, RetrievedContext, SessionError};
use tracing::debug;

/// Embeds a question and assembles the text of its `k` nearest chunks.
///
/// The question is embedded verbatim; document normalization is not applied
/// to it. Chunk texts are joined with a single space in ascending distance
/// order. With no index (zero chunks) the embedder is not called and the
/// returned context is empty.
pub struct Retriever<'a, I> {
    embedder: &'a dyn Embedder,
    index: Option<&'a I>,
    chunks: &'a [Chunk],
}

impl<'a, I: VectorIndex> Retriever<'a, I> {
    pub fn new(embedder: &'a dyn Embedder, index: Option<&'a I>, chunks: &'a [Chunk]) -> Self {
        Self {
            embedder,
            index,
            chunks,
        }
    }

    pub async fn retrieve(&self, question: &str, k: usize) -> Result<RetrievedContext, SessionError> {
        let Some(index) = self.index.filter(|index| !index.is_empty()) else {
            return Ok(RetrievedContext::default());
        };

        let texts = [question.to_string()];
        let mut vectors = self.embedder.embed(&texts).await?;
        validate_batch(&vectors, 1, None)?;
        let query = vectors.swap_remove(0);

        let neighbors = index.search(&query, k)?;
        let text = neighbors
            .iter()
            .filter_map(|neighbor| self.chunks.get(neighbor.id))
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        debug!(
            k,
            hits = neighbors.len(),
            best_distance = neighbors.first().map(|neighbor| neighbor.distance),
            "retrieved context"
        );

        Ok(RetrievedContext { text, neighbors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::chunk_fixed;
    use crate::embeddings::{CharacterHistogramEmbedder, CharacterNgramEmbedder};
    use crate::index::FlatL2Index;
    use crate::IndexError;

    async fn indexed(
        embedder: &dyn Embedder,
        text: &str,
        size: usize,
    ) -> Result<(Vec<Chunk>, FlatL2Index), SessionError> {
        let chunks = chunk_fixed(text, size)?;
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;
        Ok((chunks, FlatL2Index::build(vectors)?))
    }

    #[tokio::test]
    async fn lexical_overlap_selects_grass_chunk() -> Result<(), SessionError> {
        let embedder = CharacterHistogramEmbedder;
        let (chunks, index) = indexed(&embedder, "The sky is blue. The grass is green.", 18).await?;

        let retriever = Retriever::new(&embedder, Some(&index), &chunks);
        let context = retriever.retrieve("What color is grass?", 1).await?;

        assert_eq!(context.chunk_ids(), vec![1]);
        assert_eq!(context.text, "he grass is green.");
        Ok(())
    }

    #[tokio::test]
    async fn k_larger_than_index_returns_every_chunk() -> Result<(), SessionError> {
        let embedder = CharacterHistogramEmbedder;
        let (chunks, index) = indexed(&embedder, "The sky is blue. The grass is green.", 18).await?;

        let retriever = Retriever::new(&embedder, Some(&index), &chunks);
        let context = retriever.retrieve("What color is grass?", 10).await?;

        assert_eq!(context.chunk_ids(), vec![1, 0]);
        assert_eq!(context.text, "he grass is green. The sky is blue. T");
        Ok(())
    }

    #[tokio::test]
    async fn missing_index_yields_empty_context() -> Result<(), SessionError> {
        let embedder = CharacterHistogramEmbedder;
        let retriever: Retriever<'_, FlatL2Index> = Retriever::new(&embedder, None, &[]);
        let context = retriever.retrieve("anything", 3).await?;
        assert!(context.is_empty());
        assert!(context.neighbors.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn mismatched_query_dimension_is_an_error() -> Result<(), SessionError> {
        let (chunks, index) = indexed(&CharacterHistogramEmbedder, "The sky is blue.", 8).await?;
        let other = CharacterNgramEmbedder { dimensions: 32 };

        let retriever = Retriever::new(&other, Some(&index), &chunks);
        let error = retriever
            .retrieve("What color is the sky?", 1)
            .await
            .expect_err("dimension mismatch");

        assert!(matches!(
            error,
            SessionError::Index(IndexError::DimensionMismatch {
                expected: 26,
                actual: 32
            })
        ));
        Ok(())
    }
}
