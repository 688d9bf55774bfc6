//! Text recognition: run tesseract over each page image.
//!
//! One engine invocation per image, strictly sequential, with the binary
//! path passed explicitly on every call; recognition has no process-global
//! state. Output goes to `stdout` and is written verbatim (whitespace,
//! newlines, everything) to the page's text artifact, so the reshaper sees
//! exactly what the engine recognized.

use crate::error::Pdf2CsvError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Recognize each image artifact into a sibling `page_<n>.txt` artifact.
///
/// Returns the text artifact paths in the same order as `images`. A spawn
/// failure or non-zero engine exit aborts the stage.
pub async fn recognize_pages(
    tesseract: &Path,
    images: &[PathBuf],
) -> Result<Vec<PathBuf>, Pdf2CsvError> {
    let mut texts = Vec::with_capacity(images.len());

    for image in images {
        let text = recognize_one(tesseract, image).await?;
        let dest = image.with_extension("txt");

        tokio::fs::write(&dest, &text)
            .await
            .map_err(|e| Pdf2CsvError::ArtifactWriteFailed {
                path: dest.clone(),
                source: e,
            })?;

        info!(
            "Recognized {} → {} ({} chars)",
            image.display(),
            dest.display(),
            text.len()
        );
        texts.push(dest);
    }

    Ok(texts)
}

/// Run one engine invocation and return the raw recognized text.
async fn recognize_one(tesseract: &Path, image: &Path) -> Result<String, Pdf2CsvError> {
    let output = Command::new(tesseract)
        .arg(image)
        .arg("stdout")
        .output()
        .await
        .map_err(|e| Pdf2CsvError::OcrSpawnFailed {
            binary: tesseract.to_path_buf(),
            reason: e.to_string(),
        })?;

    // Tesseract chats on stderr (resolution estimates, empty-page notices)
    // even on success; only a non-zero exit is a failure.
    if !output.stderr.is_empty() {
        debug!(
            "tesseract stderr for {}: {}",
            image.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    if !output.status.success() {
        return Err(Pdf2CsvError::OcrFailed {
            image: image.to_path_buf(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
