//! PDF rasterization: drive `pdftoppm` to produce the page image artifacts.
//!
//! ## Why a subprocess?
//!
//! The rasterizer is an externally installed poppler binary whose location
//! comes from the settings file, so the stage is a `tokio::process` wrapper
//! rather than an in-process PDF engine. `pdftoppm` wants a filesystem path,
//! not a byte buffer, so the input bytes go into a managed tempfile that is
//! cleaned up when the stage returns.
//!
//! ## Artifact naming
//!
//! `pdftoppm` names its output `<prefix>-<nnn>.jpg` with the document's page
//! number, zero-padded to the document's width. The pipeline contract is
//! `page_<n>.jpg` with `n` counting the rendered sequence from 1, so the
//! stage renders into a scratch directory, sorts what came out, and copies
//! each file to its final name in the run directory, overwriting anything
//! already there.

use crate::config::{RunConfig, ToolPaths};
use crate::error::Pdf2CsvError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Rendering resolution. Fixed by the pipeline contract, not configurable.
pub const RENDER_DPI: u32 = 500;

/// Rasterize the configured page range into `page_<n>.jpg` artifacts.
///
/// Returns the artifact paths in page order. Any rasterizer failure aborts
/// the stage; there is no retry and no partial result.
pub async fn rasterize_pages(
    pdf_bytes: &[u8],
    tools: &ToolPaths,
    config: &RunConfig,
    run_dir: &Path,
) -> Result<Vec<PathBuf>, Pdf2CsvError> {
    let mut pdf_file = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2CsvError::Internal(format!("tempfile: {e}")))?;
    pdf_file
        .write_all(pdf_bytes)
        .map_err(|e| Pdf2CsvError::Internal(format!("tempfile write: {e}")))?;

    let scratch = tempfile::tempdir()
        .map_err(|e| Pdf2CsvError::Internal(format!("scratch dir: {e}")))?;
    let prefix = scratch.path().join("page");

    let binary = tools.pdftoppm();
    let mut cmd = Command::new(&binary);
    cmd.arg("-jpeg")
        .arg("-r")
        .arg(RENDER_DPI.to_string())
        .arg("-f")
        .arg(config.first_page.to_string())
        .arg("-l")
        .arg(config.last_page.to_string());
    if let Some(ref pw) = config.password {
        cmd.arg("-upw").arg(pw);
    }
    cmd.arg(pdf_file.path()).arg(&prefix);

    debug!(
        "Rasterizing pages {}-{} at {} DPI via {}",
        config.first_page,
        config.last_page,
        RENDER_DPI,
        binary.display()
    );

    let output = cmd
        .output()
        .await
        .map_err(|e| Pdf2CsvError::RasterizerSpawnFailed {
            binary: binary.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_failure(&stderr, config.password.is_some()));
    }

    let rendered = collect_rendered(scratch.path())?;
    if rendered.is_empty() {
        warn!(
            "Rasterizer produced no images for range {}-{}",
            config.first_page, config.last_page
        );
    }

    let mut artifacts = Vec::with_capacity(rendered.len());
    for (i, src) in rendered.iter().enumerate() {
        let dest = run_dir.join(format!("page_{}.jpg", i + 1));
        tokio::fs::copy(src, &dest)
            .await
            .map_err(|e| Pdf2CsvError::ArtifactWriteFailed {
                path: dest.clone(),
                source: e,
            })?;

        match image::image_dimensions(&dest) {
            Ok((w, h)) => debug!("Rendered {} → {}x{} px", dest.display(), w, h),
            Err(e) => warn!("Could not read dimensions of {}: {}", dest.display(), e),
        }

        artifacts.push(dest);
    }

    info!(
        "Rasterized {} page(s) into {}",
        artifacts.len(),
        run_dir.display()
    );
    Ok(artifacts)
}

/// List the scratch directory's JPEG output in page order.
///
/// `pdftoppm` zero-pads page numbers to a constant width per invocation, so a
/// lexicographic sort restores page order.
fn collect_rendered(scratch: &Path) -> Result<Vec<PathBuf>, Pdf2CsvError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(scratch)
        .map_err(|e| Pdf2CsvError::Internal(format!("scratch read: {e}")))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "jpg").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

/// Map a failed rasterizer exit to a typed error.
///
/// Password problems get their own variants so the driver can tell the user
/// whether to supply a password or fix the one they gave.
fn classify_failure(stderr: &str, password_given: bool) -> Pdf2CsvError {
    let lower = stderr.to_lowercase();
    if lower.contains("incorrect password") || lower.contains("password") {
        if password_given {
            Pdf2CsvError::WrongPassword
        } else {
            Pdf2CsvError::PasswordRequired
        }
    } else {
        Pdf2CsvError::RasterizationFailed {
            detail: stderr.trim().to_string(),
        }
    }
}
