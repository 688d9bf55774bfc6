//! Configuration types for a pipeline run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! map CLI flags onto a run, serialise the config for logging, and diff two
//! runs to understand why their outputs differ.
//!
//! The external-tool paths are deliberately NOT part of [`RunConfig`]: the
//! settings file is re-read once per run (see [`load_tool_paths`]), so a path
//! fix takes effect on the next conversion without restarting the process.

use crate::error::Pdf2CsvError;
use crate::progress::RunProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default settings-file location, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "config.toml";

/// Default summarization model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

// ── Tool paths ───────────────────────────────────────────────────────────

/// Locations of the two external tools, read from the `[settings]` section
/// of the settings file.
///
/// `PopplerPath` names the directory holding the poppler binaries
/// (`pdftoppm` among them); `TesseractPath` names the tesseract executable
/// itself. An empty value falls back to a bare command name resolved via
/// `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPaths {
    pub poppler_path: PathBuf,
    pub tesseract_path: PathBuf,
}

impl ToolPaths {
    /// The rasterizer executable to spawn.
    pub fn pdftoppm(&self) -> PathBuf {
        if self.poppler_path.as_os_str().is_empty() {
            PathBuf::from("pdftoppm")
        } else {
            self.poppler_path.join("pdftoppm")
        }
    }

    /// The OCR executable to spawn.
    pub fn tesseract(&self) -> PathBuf {
        if self.tesseract_path.as_os_str().is_empty() {
            PathBuf::from("tesseract")
        } else {
            self.tesseract_path.clone()
        }
    }
}

/// Read `PopplerPath` and `TesseractPath` from the `[settings]` section of
/// the TOML file at `path`.
///
/// Fails with a typed error before any external tool is touched: a missing
/// file, a missing `[settings]` section, and a missing key each surface as
/// their own message.
pub fn load_tool_paths(path: &Path) -> Result<ToolPaths, Pdf2CsvError> {
    let raw = std::fs::read_to_string(path).map_err(|e| Pdf2CsvError::SettingsUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let value: toml::Value = raw.parse().map_err(|e| Pdf2CsvError::SettingsUnreadable {
        path: path.to_path_buf(),
        reason: format!("not valid TOML: {e}"),
    })?;

    let section = value
        .get("settings")
        .and_then(|v| v.as_table())
        .ok_or_else(|| Pdf2CsvError::SettingsKeyMissing {
            path: path.to_path_buf(),
            key: "[settings]".to_string(),
        })?;

    let get_path = |key: &str| -> Result<PathBuf, Pdf2CsvError> {
        section
            .get(key)
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .ok_or_else(|| Pdf2CsvError::SettingsKeyMissing {
                path: path.to_path_buf(),
                key: key.to_string(),
            })
    };

    Ok(ToolPaths {
        poppler_path: get_path("PopplerPath")?,
        tesseract_path: get_path("TesseractPath")?,
    })
}

// ── Run identity ─────────────────────────────────────────────────────────

/// Identifier for one end-to-end run.
///
/// Every run gets its own artifact directory named after this id, so two
/// conversions never overwrite each other's `page_<n>.jpg` / `output.csv`
/// files. Generated ids combine the epoch timestamp with the process id;
/// callers that need stable artifact locations can supply their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh id from the wall clock, process id, and a
    /// process-local counter (two runs in the same millisecond still get
    /// distinct directories).
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        RunId(format!("{}-{}-{}", millis, std::process::id(), seq))
    }

    /// Use a caller-supplied id verbatim.
    pub fn new(id: impl Into<String>) -> Self {
        RunId(id.into())
    }

    /// Directory name for this run's artifacts, e.g. `run_1718000000000-4242`.
    pub fn dir_name(&self) -> String {
        format!("run_{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Run configuration ────────────────────────────────────────────────────

/// Configuration for one pipeline run.
///
/// Built via [`RunConfig::builder()`] or [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2csv::RunConfig;
///
/// let config = RunConfig::builder()
///     .pages(2, 5)
///     .password("secret")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// First page to rasterize (1-based, inclusive). Default: 1.
    pub first_page: u32,

    /// Last page to rasterize (1-based, inclusive). Default: 1.
    ///
    /// `first_page <= last_page` is deliberately not validated here; an
    /// inverted range reaches the rasterizer, which renders nothing, and the
    /// run completes with zero page artifacts.
    pub last_page: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Settings file holding the external-tool paths. Default: `config.toml`.
    pub settings_path: PathBuf,

    /// Directory under which the run's artifact directory is created.
    /// Default: the current directory.
    pub workdir: PathBuf,

    /// Identifier naming this run's artifact directory.
    pub run_id: RunId,

    /// Summarization model id. Default: `gemini-1.5-flash`.
    pub model: String,

    /// Per-call timeout for the summarization request in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Progress callback receiving per-stage and per-artifact events.
    pub progress: Option<Arc<dyn RunProgressCallback>>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            first_page: 1,
            last_page: 1,
            password: None,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            workdir: PathBuf::from("."),
            run_id: RunId::generate(),
            model: DEFAULT_MODEL.to_string(),
            api_timeout_secs: 60,
            progress: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("first_page", &self.first_page)
            .field("last_page", &self.last_page)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("settings_path", &self.settings_path)
            .field("workdir", &self.workdir)
            .field("run_id", &self.run_id)
            .field("model", &self.model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn RunProgressCallback>"))
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }

    /// The directory all of this run's artifacts are written into.
    pub fn run_dir(&self) -> PathBuf {
        self.workdir.join(self.run_id.dir_name())
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Set the inclusive 1-based page range. Values below 1 are clamped to 1.
    pub fn pages(mut self, first: u32, last: u32) -> Self {
        self.config.first_page = first.max(1);
        self.config.last_page = last.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        let pwd = pwd.into();
        self.config.password = if pwd.is_empty() { None } else { Some(pwd) };
        self
    }

    pub fn settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.settings_path = path.into();
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workdir = dir.into();
        self
    }

    pub fn run_id(mut self, id: RunId) -> Self {
        self.config.run_id = id;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn RunProgressCallback>) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Pdf2CsvError> {
        let c = &self.config;
        if c.first_page == 0 || c.last_page == 0 {
            return Err(Pdf2CsvError::InvalidConfig(
                "Pages are 1-based; first and last must be >= 1".into(),
            ));
        }
        if c.model.is_empty() {
            return Err(Pdf2CsvError::InvalidConfig("Model id must not be empty".into()));
        }
        Ok(self.config)
    }
}
