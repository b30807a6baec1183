use crate::error::IngestError;
use crate::models::{Chunk, ChunkStrategy, IngestionOptions};
use regex::Regex;

const SENTENCE_BOUNDARY: &str = ". ";
const WHITESPACE_PATTERN: &str = r"\s+";
const DISALLOWED_PATTERN: &str = r#"[^A-Za-z0-9.,;!?()'"$%\-]+"#;

/// Collapses whitespace, replaces characters outside the allow-list with a
/// space and trims the result. Keeps `$`, `%` and `-`.
pub fn normalize_document(text: &str) -> Result<String, IngestError> {
    let whitespace_re = Regex::new(WHITESPACE_PATTERN)?;
    let disallowed_re = Regex::new(DISALLOWED_PATTERN)?;

    let collapsed = whitespace_re.replace_all(text, " ");
    let filtered = disallowed_re.replace_all(&collapsed, " ");
    Ok(filtered.trim().to_string())
}

/// Fixed, non-overlapping windows of `size` characters.
pub fn chunk_fixed(text: &str, size: usize) -> Result<Vec<Chunk>, IngestError> {
    validate_size(size)?;
    let chars: Vec<char> = text.chars().collect();

    Ok(chars
        .chunks(size)
        .enumerate()
        .map(|(id, window)| Chunk {
            id,
            text: window.iter().collect(),
            source_offset: id * size,
        })
        .collect())
}

/// Splits after each `". "` boundary, keeping the delimiter with the sentence.
/// Sentences longer than `size` characters fall back to fixed windows.
pub fn chunk_sentences(text: &str, size: usize) -> Result<Vec<Chunk>, IngestError> {
    validate_size(size)?;

    let mut chunks = Vec::new();
    let mut offset = 0usize;

    for sentence in text.split_inclusive(SENTENCE_BOUNDARY) {
        let chars: Vec<char> = sentence.chars().collect();
        for window in chars.chunks(size) {
            chunks.push(Chunk {
                id: chunks.len(),
                text: window.iter().collect(),
                source_offset: offset,
            });
            offset += window.len();
        }
    }

    Ok(chunks)
}

pub fn chunk_text(
    normalized: &str,
    options: &IngestionOptions,
) -> Result<Vec<Chunk>, IngestError> {
    match options.strategy {
        ChunkStrategy::FixedWindow => chunk_fixed(normalized, options.chunk_size),
        ChunkStrategy::Sentences => chunk_sentences(normalized, options.chunk_size),
    }
}

/// Normalizes raw document text and chunks it. Whitespace-only input yields
/// zero chunks.
pub fn build_chunks(raw: &str, options: &IngestionOptions) -> Result<Vec<Chunk>, IngestError> {
    let normalized = normalize_document(raw)?;
    chunk_text(&normalized, options)
}

fn validate_size(size: usize) -> Result<(), IngestError> {
    if size == 0 {
        return Err(IngestError::InvalidChunkConfig(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
