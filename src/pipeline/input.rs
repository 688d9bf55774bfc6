//! Input validation: read a caller-supplied PDF into the run's byte buffer.
//!
//! The pipeline proper works on bytes (the driver accepts an upload-style
//! buffer), so all this module does is turn a filesystem path into that
//! buffer safely: existence and permission checks first, then the `%PDF`
//! magic so the rasterizer gets a meaningful error instead of garbage input.

use crate::error::Pdf2CsvError;
use std::path::Path;
use tracing::debug;

/// Read the file at `path` into memory, validating it is a readable PDF.
pub fn read_pdf(path: &Path) -> Result<Vec<u8>, Pdf2CsvError> {
    if !path.exists() {
        return Err(Pdf2CsvError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2CsvError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2CsvError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    validate_magic(&bytes, path)?;
    debug!("Read PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Check the `%PDF` magic on an in-memory buffer.
pub fn validate_magic(bytes: &[u8], path: &Path) -> Result<(), Pdf2CsvError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Pdf2CsvError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn magic_accepts_pdf_header() {
        assert!(validate_magic(b"%PDF-1.7\n...", &PathBuf::from("x.pdf")).is_ok());
    }

    #[test]
    fn magic_rejects_other_content() {
        let err = validate_magic(b"PK\x03\x04zip", &PathBuf::from("x.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2CsvError::NotAPdf { .. }));
    }

    #[test]
    fn magic_rejects_short_buffer() {
        assert!(validate_magic(b"%P", &PathBuf::from("x.pdf")).is_err());
    }

    #[test]
    fn read_pdf_missing_file() {
        let err = read_pdf(&PathBuf::from("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2CsvError::FileNotFound { .. }));
    }
}
