use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("document is not valid utf-8: {0}")]
    InvalidEncoding(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}

/// Raised when a batch cannot be embedded. Callers never see partial batches.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("embedding provider returned {status}: {details}")]
    Provider { status: u16, details: String },

    #[error("malformed embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding batch is empty")]
    EmptyBatch,

    #[error("expected {expected} embeddings, received {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding {position} has dimension {actual}, expected {expected}")]
    RaggedBatch {
        position: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("cannot build an index from zero vectors")]
    Empty,

    #[error("cannot index zero-dimensional vectors")]
    ZeroDimension,

    #[error("query vector has dimension {actual}, index holds dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector {position} has dimension {actual}, expected {expected}")]
    RaggedVectors {
        position: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("generation provider returned {status}: {details}")]
    Provider { status: u16, details: String },

    #[error("malformed generation response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document has been ingested")]
    NotIndexed,

    #[error("operation cancelled after {0:?}")]
    Cancelled(Duration),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("answer generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl SessionError {
    /// Whether the same call may simply be retried against the current session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::Generation(_) | SessionError::Cancelled(_) | SessionError::Embedding(_)
        )
    }
}
