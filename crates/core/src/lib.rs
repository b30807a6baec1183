pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod retriever;
pub mod shared;
pub mod traits;

pub use chunking::{
    build_chunks, chunk_fixed, chunk_sentences, chunk_text, normalize_document,
};
pub use embeddings::{
    validate_batch, CharacterHistogramEmbedder, CharacterNgramEmbedder,
    DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{EmbeddingError, GenerationError, IndexError, IngestError, SessionError};
pub use extractor::{extract_page_texts, join_pages, PageText, PdfExtractor};
pub use index::{squared_l2, FlatL2Index};
pub use ingest::{digest_text, load_document};
pub use models::{
    Answer, Chunk, ChunkStrategy, Document, DocumentFingerprint, GenerationRequest,
    GenerationSettings, IndexRecord, IngestionOptions, Neighbor, RetrievalOptions,
    RetrievedContext, SessionState, DEFAULT_CHUNK_SIZE, DEFAULT_TOP_K, NO_CONTEXT_MESSAGE,
};
pub use orchestrator::QaSession;
pub use providers::{HuggingFaceConfig, HuggingFaceEmbedder, HuggingFaceGenerator};
pub use retriever::Retriever;
pub use shared::SharedSession;
pub use traits::{AnswerGenerator, Embedder, VectorIndex};
