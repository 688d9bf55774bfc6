//! CLI binary for pdf2csv.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2csv::{
    load_tool_paths, GeminiClient, RunConfig, RunId, RunProgressCallback, RunStats, Stage,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner that names the current stage plus a
/// log line per artifact, in the order the pipeline writes them.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl RunProgressCallback for CliProgress {
    fn on_stage_start(&self, stage: Stage) {
        let label = match stage {
            Stage::Rasterize => "Converting PDF to JPG",
            Stage::Recognize => "Converting JPG to TXT",
            Stage::Reshape => "Converting TXT to CSV",
            Stage::Summarize => "Requesting summary",
        };
        self.bar.set_prefix(label.to_string());
        self.bar.set_message("");
        self.bar.println(format!("{} {}", cyan("◆"), bold(label)));
    }

    fn on_artifact(&self, _stage: Stage, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.bar
            .println(format!("  {} saved {}", green("✓"), dim(&name)));
    }

    fn on_run_complete(&self, stats: &RunStats) {
        self.bar.println(format!(
            "  {} {} page(s), {} row(s), {}ms",
            green("✓"),
            stats.pages_rendered,
            stats.rows_written,
            stats.total_duration_ms
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert page 1 of a PDF (tool paths from ./config.toml)
  pdf2csv invoice.pdf

  # Pages 2-5 of an encrypted PDF
  pdf2csv --first 2 --last 5 --password s3cret statement.pdf

  # Structured JSON output for scripting
  pdf2csv --json invoice.pdf > run.json

  # Verify the configured tool paths without converting anything
  pdf2csv --check-tools

SETTINGS FILE (default: config.toml):
  [settings]
  PopplerPath = "/opt/homebrew/opt/poppler/bin"   # directory holding pdftoppm
  TesseractPath = "/opt/homebrew/bin/tesseract"   # the tesseract executable

  Empty values fall back to resolving the bare command name via PATH.

ARTIFACTS:
  Each run writes page_<n>.jpg, page_<n>.txt, and output.csv into its own
  run_<id>/ directory under the working directory. Nothing is cleaned up.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       Required. Checked at startup; the process halts
                       without it.
  PDF2CSV_SETTINGS     Override the settings file path
  PDF2CSV_MODEL        Override the summarization model id
"#;

/// Convert a scanned PDF to a delimited table via OCR, then summarize it.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2csv",
    version,
    about = "Convert a scanned PDF to CSV via OCR, with model-backed summarization",
    long_about = "Convert a PDF to a comma-delimited table in three steps (rasterize pages \
with poppler, recognize text with tesseract, reshape the text into rows), then request a \
summary from a Gemini model.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file to convert.
    #[arg(required_unless_present = "check_tools")]
    input: Option<PathBuf>,

    /// First page to convert (1-based, inclusive).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    first: u32,

    /// Last page to convert (1-based, inclusive).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    last: u32,

    /// PDF user password for encrypted documents.
    #[arg(long)]
    password: Option<String>,

    /// Settings file holding PopplerPath and TesseractPath.
    #[arg(long, env = "PDF2CSV_SETTINGS", default_value = "config.toml")]
    settings: PathBuf,

    /// Directory to create the run's artifact directory in.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Explicit run id; generated when omitted.
    #[arg(long)]
    run_id: Option<String>,

    /// Summarization model id.
    #[arg(long, env = "PDF2CSV_MODEL", default_value = "gemini-1.5-flash")]
    model: String,

    /// Summarization request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    api_timeout: u64,

    /// Output the full run result as pretty JSON instead of the table + summary.
    #[arg(long)]
    json: bool,

    /// Resolve and probe the configured tool paths, then exit.
    #[arg(long)]
    check_tools: bool,

    /// Disable the progress display.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the final results.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress display carries all user-relevant feedback; library logs
    // stay at error level unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    // ── Credential check ─────────────────────────────────────────────────
    // Before anything else: a missing API key halts the process with a
    // clear message, matching the startup contract.
    let client = match GeminiClient::from_env(&cli.model, cli.api_timeout) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {e}", red("✘"));
            std::process::exit(1);
        }
    };

    // ── Tool check mode ──────────────────────────────────────────────────
    if cli.check_tools {
        return check_tools(&cli.settings);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let input = cli
        .input
        .clone()
        .expect("clap enforces input unless --check-tools");

    let mut builder = RunConfig::builder()
        .pages(cli.first, cli.last)
        .settings_path(&cli.settings)
        .workdir(&cli.workdir)
        .model(&cli.model)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref pw) = cli.password {
        builder = builder.password(pw.clone());
    }
    if let Some(ref id) = cli.run_id {
        builder = builder.run_id(RunId::new(id.clone()));
    }

    let progress = if show_progress {
        let cb = CliProgress::new();
        builder = builder.progress_callback(Arc::clone(&cb) as Arc<dyn RunProgressCallback>);
        Some(cb)
    } else {
        None
    };

    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = pdf2csv::run_from_file(&input, &client, &config)
        .await
        .context("Conversion failed")?;

    if let Some(ref cb) = progress {
        cb.finish();
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{} Conversion completed; artifacts in {}",
            green("✔"),
            bold(&config.run_dir().display().to_string())
        );
    }

    println!("CSV Data:");
    println!("{}", output.table);

    println!("Analysis Result:");
    match output.summary.error {
        None => println!("{}", output.summary.text),
        // Classified summarization failures are reported but never change
        // the exit status: the conversion itself completed.
        Some(_) => println!("{}", red(&output.summary.text)),
    }

    Ok(())
}

/// Resolve the settings file and probe both tools with a version invocation.
fn check_tools(settings: &Path) -> Result<()> {
    let tools = load_tool_paths(settings)
        .with_context(|| format!("Failed to load settings from {}", settings.display()))?;

    println!("Settings file:  {}", settings.display());
    println!("Poppler path:   {}", tools.poppler_path.display());
    println!("Tesseract path: {}", tools.tesseract_path.display());

    let mut all_ok = true;
    for (name, binary, probe) in [
        ("pdftoppm", tools.pdftoppm(), "-v"),
        ("tesseract", tools.tesseract(), "--version"),
    ] {
        let ok = std::process::Command::new(&binary)
            .arg(probe)
            .output()
            .is_ok();
        if ok {
            println!("{} {name} responds at {}", green("✓"), binary.display());
        } else {
            println!("{} {name} not runnable at {}", red("✗"), binary.display());
            all_ok = false;
        }
    }

    if !all_ok {
        anyhow::bail!("One or more tools are not runnable; fix the settings file");
    }
    Ok(())
}
