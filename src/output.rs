//! Output types: everything a completed run hands back to the caller.

use crate::config::RunId;
use crate::error::SummaryError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one end-to-end pipeline run.
///
/// Returned by [`crate::convert::run`] on success. A failed summarization
/// does not prevent this from being returned; check
/// [`SummaryOutcome::error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Identifier of the run; artifacts live under `run_<id>/`.
    pub run_id: RunId,

    /// Page image artifacts, in page order (`page_1.jpg`, `page_2.jpg`, …).
    pub images: Vec<PathBuf>,

    /// Page text artifacts, in page order, one per image.
    pub texts: Vec<PathBuf>,

    /// The table artifact (`output.csv` in the run directory).
    pub table_path: PathBuf,

    /// The table content, read back from disk for display.
    pub table: String,

    /// The summarization result or its classified failure.
    pub summary: SummaryOutcome,

    /// Timing and counts for the run.
    pub stats: RunStats,
}

/// What the summarization stage produced.
///
/// `text` always carries something displayable: the model's response on
/// success, the classified error message otherwise. This mirrors the driver
/// contract: the user sees a summary line either way, and the run still
/// reports completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutcome {
    /// Model response text, or the classified error message.
    pub text: String,

    /// Set when the call failed; `text` then holds the error's message.
    pub error: Option<SummaryError>,
}

impl SummaryOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn failed(error: SummaryError) -> Self {
        Self {
            text: error.to_string(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Timing and counts for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of page images the rasterizer produced.
    pub pages_rendered: usize,

    /// Number of text artifacts the OCR stage produced.
    pub pages_recognized: usize,

    /// Number of reshaped rows written to the table artifact.
    pub rows_written: usize,

    /// Wall-clock time spent in the rasterizer stage.
    pub render_duration_ms: u64,

    /// Wall-clock time spent in the OCR stage.
    pub ocr_duration_ms: u64,

    /// Wall-clock time spent in the summarization call.
    pub summary_duration_ms: u64,

    /// Total wall-clock time for the run.
    pub total_duration_ms: u64,
}
