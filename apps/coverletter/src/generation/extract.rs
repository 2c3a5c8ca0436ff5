//! Source text extraction for resumes and sample letters.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to extract text from PDF {path}: {message}")]
    Pdf { path: PathBuf, message: String },
}

/// Reads the text of `path`. `.pdf` files (any case) go through the PDF text
/// extractor; everything else is read as UTF-8 with invalid bytes dropped.
///
/// Blocking. Call from a blocking worker inside async code.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let text = if is_pdf(path) {
        pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode_lossy(&bytes)
    };

    info!("Extracted text from {}", path.display());
    debug!("Extracted {} chars", text.chars().count());
    Ok(text)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// UTF-8 decode that skips invalid sequences instead of substituting U+FFFD.
fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Jane Doe\nRust engineer\n").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "Jane Doe\nRust engineer\n");
    }

    #[test]
    fn test_invalid_utf8_bytes_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.md");
        std::fs::write(&path, b"caf\xC3\xA9 \xFF\xFEok").unwrap();
        assert_eq!(extract_text(&path).unwrap(), "café ok");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_text(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }), "got {err:?}");
    }

    #[test]
    fn test_pdf_extension_is_case_insensitive() {
        assert!(is_pdf(Path::new("Resume.PDF")));
        assert!(is_pdf(Path::new("resume.pdf")));
        assert!(!is_pdf(Path::new("resume.pdf.txt")));
        assert!(!is_pdf(Path::new("resume")));
    }

    #[test]
    fn test_corrupt_pdf_is_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf { .. }), "got {err:?}");
    }
}
