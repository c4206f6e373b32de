//! Source document reader.
//!
//! Turns a document path into ordered [`Page`]s of plain text. PDF files
//! are extracted page by page; plain text and Markdown files become a
//! single page. Consumed by the ingestion pipeline only.

use std::path::Path;

use crate::models::Page;

/// Reader failure. Fatal to an ingestion run; nothing is committed to the
/// index when reading fails.
#[derive(Debug)]
pub enum ReadError {
    UnsupportedFormat(String),
    Io(String),
    Pdf(String),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::UnsupportedFormat(ext) => {
                write!(f, "unsupported document format: {}", ext)
            }
            ReadError::Io(e) => write!(f, "failed to read document: {}", e),
            ReadError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ReadError {}

/// Extract ordered page texts from a source document.
///
/// Supported formats are routed by file extension: `.pdf` via
/// `pdf-extract`, `.txt`/`.md` as a single page. Page indices are
/// contiguous from 0 in document order.
pub fn read_pages(path: &Path) -> Result<Vec<Page>, ReadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => read_pdf(path),
        "txt" | "md" => read_plain(path),
        other => Err(ReadError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}

fn read_pdf(path: &Path) -> Result<Vec<Page>, ReadError> {
    let texts = pdf_extract::extract_text_by_pages(path).map_err(|e| ReadError::Pdf(e.to_string()))?;

    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page {
            page_index: i as i64,
            text,
        })
        .collect())
}

fn read_plain(path: &Path) -> Result<Vec<Page>, ReadError> {
    let text = std::fs::read_to_string(path).map_err(|e| ReadError::Io(e.to_string()))?;

    Ok(vec![Page {
        page_index: 0,
        text,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_returns_error() {
        let err = read_pages(Path::new("notes.docx")).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_text_file_returns_io_error() {
        let err = read_pages(Path::new("/nonexistent/notes.txt")).unwrap_err();
        assert!(matches!(err, ReadError::Io(_)));
    }

    #[test]
    fn plain_text_is_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "Line one.\n\nLine two.").unwrap();

        let pages = read_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_index, 0);
        assert!(pages[0].text.contains("Line two."));
    }

    #[test]
    fn invalid_pdf_returns_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = read_pages(&path).unwrap_err();
        assert!(matches!(err, ReadError::Pdf(_)));
    }
}
