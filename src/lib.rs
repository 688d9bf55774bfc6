//! # pdf2csv
//!
//! Convert scanned PDFs to a delimited table via OCR, then summarize the
//! result with a generative model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Rasterize  pdftoppm renders the page range to page_<n>.jpg (500 DPI)
//!  ├─ 2. Recognize  tesseract reads each image into page_<n>.txt
//!  ├─ 3. Reshape    fixed substitution rule turns OCR lines into output.csv
//!  └─ 4. Summarize  one Gemini generateContent call (classified, non-fatal)
//! ```
//!
//! The first three stages wrap external tools whose locations come from a
//! settings file (`[settings]` section, `PopplerPath` and `TesseractPath`
//! keys); the last stage needs `GEMINI_API_KEY` in the environment. Each
//! run's artifacts are written under their own `run_<id>/` directory and
//! left on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2csv::{run_from_file, GeminiClient, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::from_env("gemini-1.5-flash", 60)?;
//!     let config = RunConfig::builder().pages(1, 3).build()?;
//!     let output = run_from_file("invoice.pdf", &client, &config).await?;
//!     println!("{}", output.table);
//!     println!("{}", output.summary.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Known limitation
//!
//! The table transform is a lossy heuristic, not a quoting/escaping CSV
//! encoder: commas in the recognized text are dropped and every space
//! becomes a delimiter. See [`pipeline::reshape`] before pointing a strict
//! CSV parser at the output.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{load_tool_paths, RunConfig, RunConfigBuilder, RunId, ToolPaths};
pub use convert::{run, run_from_file};
pub use error::{Pdf2CsvError, SummaryError};
pub use output::{RunOutput, RunStats, SummaryOutcome};
pub use pipeline::summarize::GeminiClient;
pub use progress::{NoopProgressCallback, RunProgressCallback, Stage};
