use crate::extractor::{extract_page_texts, join_pages};
use crate::{Document, DocumentFingerprint, IngestError};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

const INLINE_TITLE: &str = "inline";

pub fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generate_document_id(source: &str, checksum: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(checksum.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

impl Document {
    pub fn new(title: &str, source_path: &str, text: String) -> Self {
        let checksum = digest_text(&text);
        Self {
            fingerprint: DocumentFingerprint {
                document_id: generate_document_id(source_path, &checksum),
                document_title: title.to_string(),
                source_path: source_path.to_string(),
                checksum,
                ingested_at: Utc::now(),
            },
            text,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(INLINE_TITLE, "", text.into())
    }
}

/// Reads a document from disk: `.pdf` files through page text extraction,
/// anything else as UTF-8 text.
pub async fn load_document(path: &Path) -> Result<Document, IngestError> {
    let text = if is_pdf(path) {
        let owned = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || extract_page_texts(&owned))
            .await
            .map_err(|error| IngestError::PdfParse(error.to_string()))??;
        join_pages(&pages)
    } else {
        let bytes = tokio::fs::read(path).await?;
        String::from_utf8(bytes)
            .map_err(|error| IngestError::InvalidEncoding(format!("{}: {error}", path.display())))?
    };

    let title = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(INLINE_TITLE);

    debug!(path = %path.display(), chars = text.chars().count(), "document loaded");
    Ok(Document::new(title, &path.to_string_lossy(), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn checksum_is_reproducible() {
        let first = Document::from_text("abc");
        let second = Document::from_text("abc");
        assert_eq!(first.fingerprint.checksum, second.fingerprint.checksum);
        assert_eq!(first.fingerprint.document_id, second.fingerprint.document_id);
        assert_ne!(
            first.fingerprint.checksum,
            Document::from_text("abd").fingerprint.checksum
        );
    }

    #[tokio::test]
    async fn text_files_are_loaded_verbatim() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Line one.\n\nLine two.")?;

        let document = load_document(&path).await?;
        assert_eq!(document.text, "Line one.\n\nLine two.");
        assert_eq!(document.fingerprint.document_title, "notes.txt");
        assert_eq!(document.fingerprint.checksum, digest_text("Line one.\n\nLine two."));
        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_text_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0x00])?;

        let result = load_document(&path).await;
        assert!(matches!(result, Err(IngestError::InvalidEncoding(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_pdf_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("Report.PDF");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = load_document(&path).await;
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }
}
