//! Progress-callback trait for per-stage run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the pipeline moves through its stages and writes artifacts.
//!
//! # Why callbacks instead of channels?
//!
//! The callback is the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a log, or a UI status line without the
//! library knowing how the host application communicates. All methods have
//! default no-op implementations so callers only override what they care
//! about.

use crate::output::RunStats;
use std::fmt;
use std::path::Path;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// PDF bytes → page image artifacts.
    Rasterize,
    /// Page images → page text artifacts.
    Recognize,
    /// Page text → table artifact.
    Reshape,
    /// Table → model summary.
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Rasterize => "rasterize",
            Stage::Recognize => "recognize",
            Stage::Reshape => "reshape",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

/// Called by the pipeline as a run progresses.
///
/// Stages execute strictly sequentially, so implementations are never called
/// concurrently; the `Send + Sync` bound exists so a callback can cross the
/// async runtime's task boundaries.
pub trait RunProgressCallback: Send + Sync {
    /// Called once when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called for each artifact a stage produced.
    fn on_artifact(&self, stage: Stage, path: &Path) {
        let _ = (stage, path);
    }

    /// Called once after the summarization stage, fatal or not.
    fn on_run_complete(&self, stats: &RunStats) {
        let _ = stats;
    }
}

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn noop_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopProgressCallback>();

        let cb: Arc<dyn RunProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Rasterize);
        cb.on_artifact(Stage::Reshape, Path::new("output.csv"));
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Rasterize.to_string(), "rasterize");
        assert_eq!(Stage::Summarize.to_string(), "summarize");
    }
}
