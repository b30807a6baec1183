use crate::traits::Embedder;
use crate::EmbeddingError;
use async_trait::async_trait;

const DEFAULT: usize = 128;
const ALPHABET: usize = 26;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Offline embedder hashing lower-cased character trigrams into a unit vector.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl CharacterNgramEmbedder {
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions.max(1)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Raw counts of the ASCII letters `a..=z`, case-folded. Other characters are
/// ignored. Deterministic and handy for retrieval tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterHistogramEmbedder;

impl CharacterHistogramEmbedder {
    pub fn histogram(text: &str) -> Vec<f32> {
        let mut counts = vec![0f32; ALPHABET];
        for byte in text.bytes().filter(u8::is_ascii_alphabetic) {
            counts[(byte.to_ascii_lowercase() - b'a') as usize] += 1.0;
        }
        counts
    }
}

#[async_trait]
impl Embedder for CharacterHistogramEmbedder {
    fn dimensions(&self) -> usize {
        ALPHABET
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| Self::histogram(text)).collect())
    }
}

/// Checks a provider batch before it reaches an index: one vector per input,
/// all of the same dimension.
pub fn validate_batch(
    vectors: &[Vec<f32>],
    expected_count: usize,
    expected_dimensions: Option<usize>,
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            expected: expected_count,
            actual: vectors.len(),
        });
    }

    let Some(expected) = expected_dimensions.or_else(|| vectors.first().map(Vec::len)) else {
        return Ok(());
    };

    match vectors
        .iter()
        .enumerate()
        .find(|(_, vector)| vector.len() != expected)
    {
        Some((position, vector)) => Err(EmbeddingError::RaggedBatch {
            position,
            expected,
            actual: vector.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| text.to_string()).collect()
    }

    #[tokio::test]
    async fn embedder_is_deterministic() -> Result<(), EmbeddingError> {
        let embedder = CharacterNgramEmbedder::default();
        let texts = batch(&["Hydraulic pressure and flow"]);
        let first = embedder.embed(&texts).await?;
        let second = embedder.embed(&texts).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn embedder_outputs_expected_length() -> Result<(), EmbeddingError> {
        let embedder = CharacterNgramEmbedder { dimensions: 32 };
        let vectors = embedder.embed(&batch(&["abc", "", "defg"])).await?;
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|vector| vector.len() == 32));
        Ok(())
    }

    #[test]
    fn histogram_counts_letters_case_insensitively() {
        let counts = CharacterHistogramEmbedder::histogram("Aa b! 9z");
        assert_eq!(counts.len(), 26);
        assert_eq!(counts[0], 2.0);
        assert_eq!(counts[1], 1.0);
        assert_eq!(counts[25], 1.0);
        assert_eq!(counts.iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn batch_validation_rejects_short_and_ragged_batches() {
        let vectors = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(
            validate_batch(&vectors, 3, None),
            Err(EmbeddingError::CountMismatch { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            validate_batch(&vectors, 2, None),
            Err(EmbeddingError::RaggedBatch { position: 1, .. })
        ));
        assert!(matches!(
            validate_batch(&vectors[..1], 1, Some(4)),
            Err(EmbeddingError::RaggedBatch { position: 0, expected: 4, actual: 2 })
        ));
        assert!(validate_batch(&vectors[..1], 1, Some(2)).is_ok());
    }
}
