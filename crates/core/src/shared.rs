use crate::orchestrator::QaSession;
use crate::{Answer, Document, IndexRecord, SessionError, SessionState};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle that serializes every call into one [`QaSession`].
///
/// Handles for different sessions share nothing but the providers the
/// sessions were built with.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<QaSession>>,
}

impl SharedSession {
    pub fn new(session: QaSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn ingest(&self, document: Document) -> Result<SessionState, SessionError> {
        self.inner.lock().await.ingest(document).await
    }

    pub async fn ask(&self, question: &str) -> Result<Answer, SessionError> {
        self.inner.lock().await.ask(question).await
    }

    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }

    pub async fn records(&self) -> Vec<IndexRecord> {
        self.inner.lock().await.records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterHistogramEmbedder;
    use crate::traits::AnswerGenerator;
    use crate::{GenerationError, GenerationRequest, IngestionOptions};
    use async_trait::async_trait;

    struct EchoGenerator;

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            Ok(request.context.clone())
        }
    }

    #[tokio::test]
    async fn concurrent_callers_see_consistent_answers() -> Result<(), SessionError> {
        let session = QaSession::new(Arc::new(CharacterHistogramEmbedder), Arc::new(EchoGenerator))
            .with_ingestion_options(IngestionOptions {
                chunk_size: 18,
                ..IngestionOptions::default()
            });
        let shared = SharedSession::new(session);
        shared
            .ingest(Document::from_text("The sky is blue. The grass is green."))
            .await?;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let handle = shared.clone();
            handles.push(tokio::spawn(async move {
                handle.ask("What color is grass?").await
            }));
        }

        for handle in handles {
            let answer = handle.await.expect("ask task panicked")?;
            assert_eq!(answer.to_string(), "he grass is green.");
        }

        shared.reset().await;
        assert_eq!(shared.state().await, SessionState::Empty);
        assert!(shared.records().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn sessions_are_isolated() -> Result<(), SessionError> {
        let embedder = Arc::new(CharacterHistogramEmbedder);
        let generator = Arc::new(EchoGenerator);
        let first = SharedSession::new(QaSession::new(embedder.clone(), generator.clone()));
        let second = SharedSession::new(QaSession::new(embedder, generator));

        let (left, right) = tokio::join!(
            first.ingest(Document::from_text("Alpha document.")),
            second.ingest(Document::from_text(""))
        );

        assert_eq!(left?, SessionState::Indexed { chunks: 1 });
        assert_eq!(right?, SessionState::Indexed { chunks: 0 });
        assert_eq!(second.ask("alpha?").await?, Answer::NoContext);
        assert_eq!(first.ask("alpha?").await?.to_string(), "Alpha document.");
        Ok(())
    }
}
