//! The summarization instruction sent to the model.
//!
//! Centralising the prompt here keeps it a single source of truth and lets
//! unit tests inspect it without making a network call. The instruction is a
//! fixed string: the request is not parameterized by the run's table content
//! (see [`crate::pipeline::summarize::summarize_table`]).

/// Fixed instruction sent with every summarization request.
pub const SUMMARY_PROMPT: &str =
    "Extract the key details from the converted document table.";
