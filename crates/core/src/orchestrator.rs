use crate::chunking::build_chunks;
use crate::embeddings::validate_batch;
use crate::index::FlatL2Index;
use crate::retriever::Retriever;
use crate::traits::{AnswerGenerator, Embedder, VectorIndex};
use crate::{
    Answer, Chunk, Document, GenerationRequest, GenerationSettings, IndexRecord, IngestionOptions,
    RetrievalOptions, RetrievedContext, SessionError, SessionState,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct IndexedDocument {
    document: Document,
    chunks: Vec<Chunk>,
    // None when the document produced no chunks.
    index: Option<FlatL2Index>,
}

/// One document's question-answering lifecycle.
///
/// `Empty` until [`QaSession::ingest`] succeeds, then `Indexed` until the
/// next ingest or [`QaSession::reset`]. Ingest builds the replacement state
/// off to the side and swaps it in only once every step succeeded, so a
/// failed or cancelled ingest leaves the previous state untouched.
pub struct QaSession {
    id: Uuid,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn AnswerGenerator>,
    ingestion: IngestionOptions,
    retrieval: RetrievalOptions,
    generation: GenerationSettings,
    indexed: Option<IndexedDocument>,
}

impl QaSession {
    pub fn new(embedder: Arc<dyn Embedder>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedder,
            generator,
            ingestion: IngestionOptions::default(),
            retrieval: RetrievalOptions::default(),
            generation: GenerationSettings::default(),
            indexed: None,
        }
    }

    pub fn with_ingestion_options(mut self, options: IngestionOptions) -> Self {
        self.ingestion = options;
        self
    }

    pub fn with_retrieval_options(mut self, options: RetrievalOptions) -> Self {
        self.retrieval = options;
        self
    }

    pub fn with_generation_settings(mut self, settings: GenerationSettings) -> Self {
        self.generation = settings;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        match &self.indexed {
            None => SessionState::Empty,
            Some(indexed) => SessionState::Indexed {
                chunks: indexed.chunks.len(),
            },
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.indexed.as_ref().map(|indexed| &indexed.document)
    }

    pub fn chunks(&self) -> &[Chunk] {
        self.indexed
            .as_ref()
            .map(|indexed| indexed.chunks.as_slice())
            .unwrap_or_default()
    }

    /// Swaps the embedding provider. An index built with a different
    /// dimension makes later questions fail with a dimension mismatch.
    pub fn replace_embedder(&mut self, embedder: Arc<dyn Embedder>) {
        self.embedder = embedder;
    }

    pub async fn ingest(&mut self, document: Document) -> Result<SessionState, SessionError> {
        let chunks = build_chunks(&document.text, &self.ingestion)?;

        let index = if chunks.is_empty() {
            warn!(
                session = %self.id,
                document = %document.fingerprint.document_title,
                "document produced no chunks; questions will find no context"
            );
            None
        } else {
            let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            validate_batch(&vectors, texts.len(), None)?;
            Some(FlatL2Index::build(vectors)?)
        };

        info!(
            session = %self.id,
            document = %document.fingerprint.document_title,
            checksum = %document.fingerprint.checksum,
            chunk_count = chunks.len(),
            dimensions = index.as_ref().map(|index| index.dimensions()).unwrap_or(0),
            "document indexed"
        );

        self.indexed = Some(IndexedDocument {
            document,
            chunks,
            index,
        });
        Ok(self.state())
    }

    pub async fn ingest_with_deadline(
        &mut self,
        document: Document,
        deadline: Duration,
    ) -> Result<SessionState, SessionError> {
        with_deadline(deadline, self.ingest(document)).await
    }

    pub fn reset(&mut self) {
        if self.indexed.take().is_some() {
            info!(session = %self.id, "session reset");
        }
    }

    pub async fn retrieve(&self, question: &str) -> Result<RetrievedContext, SessionError> {
        let indexed = self.indexed.as_ref().ok_or(SessionError::NotIndexed)?;
        Retriever::new(
            self.embedder.as_ref(),
            indexed.index.as_ref(),
            &indexed.chunks,
        )
        .retrieve(question, self.retrieval.top_k)
        .await
    }

    /// Answers one question independently of any earlier ones. The generator
    /// is only called when retrieval found some context.
    pub async fn ask(&self, question: &str) -> Result<Answer, SessionError> {
        let context = self.retrieve(question).await?;
        if context.is_empty() {
            debug!(session = %self.id, "no context for question");
            return Ok(Answer::NoContext);
        }

        let request = GenerationRequest::new(&context.text, question, self.generation);
        let text = self.generator.generate(&request).await?;

        Ok(Answer::Generated {
            text,
            chunk_ids: context.chunk_ids(),
        })
    }

    pub async fn ask_with_deadline(
        &self,
        question: &str,
        deadline: Duration,
    ) -> Result<Answer, SessionError> {
        with_deadline(deadline, self.ask(question)).await
    }

    /// `{id, text, vector}` for every chunk, in id order.
    pub fn records(&self) -> Vec<IndexRecord> {
        let Some(IndexedDocument {
            chunks,
            index: Some(index),
            ..
        }) = &self.indexed
        else {
            return Vec::new();
        };

        chunks
            .iter()
            .filter_map(|chunk| {
                index.vector(chunk.id).map(|vector| IndexRecord {
                    id: chunk.id,
                    text: chunk.text.clone(),
                    vector: vector.to_vec(),
                })
            })
            .collect()
    }
}

async fn with_deadline<T>(
    deadline: Duration,
    operation: impl Future<Output = Result<T, SessionError>>,
) -> Result<T, SessionError> {
    tokio::time::timeout(deadline, operation)
        .await
        .map_err(|_| SessionError::Cancelled(deadline))?
}
