//! Run orchestration: the four stages, strictly in order.
//!
//! [`run`] is the primary entry point. The stage sequence is fixed: settings
//! load, rasterize, recognize, reshape, summarize. A fatal error anywhere in
//! the first four steps aborts the remaining stages; the summarization stage
//! never aborts the run; its failures come back classified inside the
//! [`RunOutput`].

use crate::config::{self, RunConfig};
use crate::error::Pdf2CsvError;
use crate::output::{RunOutput, RunStats};
use crate::pipeline::summarize::GeminiClient;
use crate::pipeline::{input, ocr, render, reshape, summarize};
use crate::progress::Stage;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Run the full pipeline over an in-memory PDF.
///
/// # Arguments
/// * `pdf_bytes` — raw PDF bytes (an upload-style buffer)
/// * `client`    — summarization client, constructed once at process start
/// * `config`    — run configuration
///
/// # Returns
/// `Ok(RunOutput)` when stages 1–3 succeed, even if summarization failed
/// (check `output.summary.error`).
///
/// # Errors
/// Returns `Err(Pdf2CsvError)` for fatal errors only: settings problems,
/// rasterizer or OCR failures, artifact I/O failures.
pub async fn run(
    pdf_bytes: &[u8],
    client: &GeminiClient,
    config: &RunConfig,
) -> Result<RunOutput, Pdf2CsvError> {
    let total_start = Instant::now();
    info!("Starting run {}", config.run_id);

    // ── Settings ─────────────────────────────────────────────────────────
    // Loaded per run, and before any external tool is touched: a missing
    // key must fail here, with zero side effects on disk.
    let tools = config::load_tool_paths(&config.settings_path)?;

    let run_dir = config.run_dir();
    tokio::fs::create_dir_all(&run_dir)
        .await
        .map_err(|e| Pdf2CsvError::ArtifactWriteFailed {
            path: run_dir.clone(),
            source: e,
        })?;

    // ── Stage 1: rasterize ───────────────────────────────────────────────
    stage_start(config, Stage::Rasterize);
    let render_start = Instant::now();
    let images = render::rasterize_pages(pdf_bytes, &tools, config, &run_dir).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    artifacts_done(config, Stage::Rasterize, &images);

    // ── Stage 2: recognize ───────────────────────────────────────────────
    stage_start(config, Stage::Recognize);
    let ocr_start = Instant::now();
    let texts = ocr::recognize_pages(&tools.tesseract(), &images).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    artifacts_done(config, Stage::Recognize, &texts);

    // ── Stage 3: reshape ─────────────────────────────────────────────────
    stage_start(config, Stage::Reshape);
    let (table_path, rows) = reshape::reshape_to_table(&texts, &run_dir).await?;
    if let Some(ref cb) = config.progress {
        cb.on_artifact(Stage::Reshape, &table_path);
    }

    // Read the table back from disk for display; what the caller sees is
    // exactly what landed in the artifact.
    let table = tokio::fs::read_to_string(&table_path).await.map_err(|e| {
        Pdf2CsvError::Internal(format!("read {}: {e}", table_path.display()))
    })?;

    // ── Stage 4: summarize (non-fatal) ───────────────────────────────────
    stage_start(config, Stage::Summarize);
    let summary_start = Instant::now();
    let summary = summarize::summarize_table(client, &table).await;
    let summary_duration_ms = summary_start.elapsed().as_millis() as u64;

    let stats = RunStats {
        pages_rendered: images.len(),
        pages_recognized: texts.len(),
        rows_written: rows.len(),
        render_duration_ms,
        ocr_duration_ms,
        summary_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Run {} complete: {} page(s), {} row(s), {}ms total",
        config.run_id, stats.pages_rendered, stats.rows_written, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress {
        cb.on_run_complete(&stats);
    }

    Ok(RunOutput {
        run_id: config.run_id.clone(),
        images,
        texts,
        table_path,
        table,
        summary,
        stats,
    })
}

/// Run the pipeline over a PDF file on disk.
///
/// Validates existence, readability, and the `%PDF` magic before the bytes
/// enter the pipeline.
pub async fn run_from_file(
    pdf_path: impl AsRef<Path>,
    client: &GeminiClient,
    config: &RunConfig,
) -> Result<RunOutput, Pdf2CsvError> {
    let bytes = input::read_pdf(pdf_path.as_ref())?;
    run(&bytes, client, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn stage_start(config: &RunConfig, stage: Stage) {
    if let Some(ref cb) = config.progress {
        cb.on_stage_start(stage);
    }
}

fn artifacts_done(config: &RunConfig, stage: Stage, paths: &[std::path::PathBuf]) {
    if let Some(ref cb) = config.progress {
        for path in paths {
            cb.on_artifact(stage, path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunId;

    fn test_config(dir: &Path, settings: &Path) -> RunConfig {
        RunConfig::builder()
            .workdir(dir)
            .settings_path(settings)
            .run_id(RunId::new("test"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn missing_settings_fails_before_any_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("absent.toml");
        let config = test_config(dir.path(), &settings);
        let client = GeminiClient::new("k", "gemini-1.5-flash", 5).unwrap();

        let err = run(b"%PDF-1.4 fake", &client, &config).await.unwrap_err();
        assert!(matches!(err, Pdf2CsvError::SettingsUnreadable { .. }));

        // The run directory must not have been created.
        assert!(!config.run_dir().exists());
    }

    #[tokio::test]
    async fn missing_settings_key_fails_before_any_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("config.toml");
        std::fs::write(&settings, "[settings]\nPopplerPath = \"\"\n").unwrap();
        let config = test_config(dir.path(), &settings);
        let client = GeminiClient::new("k", "gemini-1.5-flash", 5).unwrap();

        let err = run(b"%PDF-1.4 fake", &client, &config).await.unwrap_err();
        match err {
            Pdf2CsvError::SettingsKeyMissing { key, .. } => assert_eq!(key, "TesseractPath"),
            other => panic!("expected SettingsKeyMissing, got {other:?}"),
        }
        assert!(!config.run_dir().exists());
    }

    #[tokio::test]
    async fn run_from_file_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("doc.pdf");
        std::fs::write(&bogus, b"not a pdf at all").unwrap();
        let settings = dir.path().join("config.toml");
        std::fs::write(
            &settings,
            "[settings]\nPopplerPath = \"\"\nTesseractPath = \"\"\n",
        )
        .unwrap();
        let config = test_config(dir.path(), &settings);
        let client = GeminiClient::new("k", "gemini-1.5-flash", 5).unwrap();

        let err = run_from_file(&bogus, &client, &config).await.unwrap_err();
        assert!(matches!(err, Pdf2CsvError::NotAPdf { .. }));
    }
}
