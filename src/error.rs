//! Error types for the pdf2csv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2CsvError`] — **Fatal**: the run cannot proceed (bad input file,
//!   missing settings key, rasterizer or OCR failure). Returned as
//!   `Err(Pdf2CsvError)` from [`crate::convert::run`] and aborts the
//!   remaining stages.
//!
//! * [`SummaryError`] — **Non-fatal**: the summarization call failed, but the
//!   table artifacts already exist and the run still reports completion.
//!   Stored inside [`crate::output::SummaryOutcome`] so callers see the
//!   classified failure next to the rest of the run's results.
//!
//! The split mirrors the pipeline's contract: stages 1–3 have no recovery
//! path, stage 4 is reported but never escalated.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2csv library.
///
/// Summarization failures use [`SummaryError`] and are stored in
/// [`crate::output::SummaryOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2CsvError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Settings errors ───────────────────────────────────────────────────
    /// The settings file could not be read.
    #[error("Cannot read settings file '{path}': {reason}")]
    SettingsUnreadable { path: PathBuf, reason: String },

    /// The settings file parsed, but the `[settings]` section or one of its
    /// keys is absent.
    #[error("Settings file '{path}' is missing '{key}'\nExpected a [settings] section with PopplerPath and TesseractPath.")]
    SettingsKeyMissing { path: PathBuf, key: String },

    /// The required API credential is not present in the environment.
    #[error("GEMINI_API_KEY is not set.\nExport it before starting: export GEMINI_API_KEY=...")]
    ApiKeyMissing,

    // ── Rasterizer errors ─────────────────────────────────────────────────
    /// The rasterizer binary could not be spawned at the configured path.
    #[error("Failed to run rasterizer '{binary}': {reason}\nCheck PopplerPath in the settings file.")]
    RasterizerSpawnFailed { binary: PathBuf, reason: String },

    /// The PDF is encrypted and no password was supplied.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was supplied but the rasterizer rejected it.
    #[error("Wrong password for the input PDF")]
    WrongPassword,

    /// The rasterizer exited with a failure status.
    #[error("Rasterizer failed: {detail}")]
    RasterizationFailed { detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR binary could not be spawned at the configured path.
    #[error("Failed to run OCR engine '{binary}': {reason}\nCheck TesseractPath in the settings file.")]
    OcrSpawnFailed { binary: PathBuf, reason: String },

    /// The OCR engine exited with a failure status on one page image.
    #[error("OCR failed on '{image}': {detail}")]
    OcrFailed { image: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an artifact in the run directory.
    #[error("Failed to write artifact '{path}': {source}")]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal, classified summarization failure.
///
/// The three variants match the three user-facing messages the driver shows:
/// a field of the response decoded to the wrong type, an expected field was
/// absent, or anything else (transport, HTTP status, body read). None of them
/// fail the run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SummaryError {
    /// A response field was present but had the wrong JSON type.
    #[error("Summary response had an unexpected shape: {detail}")]
    Shape { detail: String },

    /// An expected response field was absent.
    #[error("Summary response was missing '{field}'")]
    MissingField { field: String },

    /// Transport error, non-success HTTP status, or any other failure.
    #[error("Summarization failed: {detail}")]
    Other { detail: String },
}
