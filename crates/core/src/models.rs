use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_TOP_K: usize = 1;
pub const NO_CONTEXT_MESSAGE: &str = "No relevant context found. Try rephrasing your question.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub document_title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// Raw document text. Immutable once handed to a session.
#[derive(Debug, Clone)]
pub struct Document {
    pub fingerprint: DocumentFingerprint,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub source_offset: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkStrategy {
    #[default]
    FixedWindow,
    Sentences,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub chunk_size: usize,
    pub strategy: ChunkStrategy,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            strategy: ChunkStrategy::FixedWindow,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub top_k: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub text: String,
    pub neighbors: Vec<Neighbor>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn chunk_ids(&self) -> Vec<usize> {
        self.neighbors.iter().map(|neighbor| neighbor.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Generated { text: String, chunk_ids: Vec<usize> },
    NoContext,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Generated { text, .. } => f.write_str(text),
            Answer::NoContext => f.write_str(NO_CONTEXT_MESSAGE),
        }
    }
}

/// One exported `{id, text, vector}` entry of a built session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Indexed { chunks: usize },
}

pub const DEFAULT_MAX_OUTPUT_LENGTH: usize = 300;
pub const DEFAULT_TEMPERATURE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_output_length: usize,
    pub temperature: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_output_length: DEFAULT_MAX_OUTPUT_LENGTH,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub context: String,
    pub question: String,
    pub max_output_length: usize,
    pub temperature: f64,
}

impl GenerationRequest {
    pub fn new(context: &str, question: &str, settings: GenerationSettings) -> Self {
        Self {
            context: context.to_string(),
            question: question.to_string(),
            max_output_length: settings.max_output_length,
            temperature: settings.temperature,
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Context: {}\n\nQuestion: {}\nAnswer:",
            self.context, self.question
        )
    }
}
