//! Summarization: one Gemini `generateContent` call per run.
//!
//! The only stage with network I/O, and the only one whose failures do not
//! abort the run: every error is classified into one of three user-facing
//! categories (see [`SummaryError`]) and handed back alongside the run's
//! other results.
//!
//! ## Classification
//!
//! The three categories mirror what can actually go wrong with the response:
//! a field decoded to the wrong JSON type (**shape**), an expected field was
//! absent (**missing field**), and everything else (transport errors,
//! timeouts, non-success HTTP statuses: **other**). The split matters to the
//! driver: each category gets its own message, but none of them fail the run.

use crate::error::{Pdf2CsvError, SummaryError};
use crate::output::SummaryOutcome;
use crate::prompts::SUMMARY_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client with an explicit credential.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, Pdf2CsvError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Pdf2CsvError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build a client from the `GEMINI_API_KEY` environment variable.
    ///
    /// The driver calls this once at startup so a missing credential halts
    /// the process before any work is accepted.
    pub fn from_env(model: impl Into<String>, timeout_secs: u64) -> Result<Self, Pdf2CsvError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(Pdf2CsvError::ApiKeyMissing)?;
        Self::new(api_key, model, timeout_secs)
    }

    /// Override the endpoint base URL (tests point this at a local listener).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send `prompt` to the model and return its text response.
    pub async fn generate(&self, prompt: &str) -> Result<String, SummaryError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| SummaryError::Other {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::Other {
                detail: format!("HTTP {status}: {}", snippet(&body)),
            });
        }

        let value: serde_json::Value =
            response.json().await.map_err(|e| SummaryError::Other {
                detail: format!("response body: {e}"),
            })?;

        debug!("generateContent responded for model {}", self.model);
        extract_text(value)
    }
}

/// Pull the response text out of a `generateContent` response value.
///
/// Decoding happens in two steps so failures classify cleanly: a typed
/// decode catches wrong-typed fields (shape errors), then the `Option`
/// walk catches absent ones (missing-field errors).
fn extract_text(value: serde_json::Value) -> Result<String, SummaryError> {
    let response: GenerateResponse =
        serde_json::from_value(value).map_err(|e| SummaryError::Shape {
            detail: e.to_string(),
        })?;

    let candidates = response
        .candidates
        .filter(|c| !c.is_empty())
        .ok_or_else(|| missing("candidates"))?;

    let content = candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| missing("content"))?;

    let parts = content
        .parts
        .filter(|p| !p.is_empty())
        .ok_or_else(|| missing("parts"))?;

    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        return Err(missing("text"));
    }
    Ok(text)
}

fn missing(field: &str) -> SummaryError {
    SummaryError::MissingField {
        field: field.to_string(),
    }
}

/// First line of an error body, truncated, for the catch-all message.
fn snippet(body: &str) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    if line.len() > 120 {
        let mut end = 119;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &line[..end])
    } else {
        line.to_string()
    }
}

/// Summarize a run's table.
///
/// Accepts the assembled table content but sends only the fixed instruction
/// prompt; the table itself is not transmitted.
// TODO: product decision pending on whether the table content should be
// included in the request body; keep the signature stable either way.
pub async fn summarize_table(client: &GeminiClient, _table: &str) -> SummaryOutcome {
    match client.generate(SUMMARY_PROMPT).await {
        Ok(text) => SummaryOutcome::success(text),
        Err(e) => {
            warn!("Summarization failed: {e}");
            SummaryOutcome::failed(e)
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

// Every response field is optional so absence is reported as a
// missing-field error rather than a decode failure.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<CandidateOut>>,
}

#[derive(Debug, Deserialize)]
struct CandidateOut {
    content: Option<ContentOut>,
}

#[derive(Debug, Deserialize)]
struct ContentOut {
    parts: Option<Vec<PartOut>>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_text_happy_path() {
        let value = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Key details: none." } ] } }
            ]
        });
        assert_eq!(extract_text(value).unwrap(), "Key details: none.");
    }

    #[test]
    fn extract_text_joins_multiple_parts() {
        let value = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "a" }, { "text": "b" } ] } }
            ]
        });
        assert_eq!(extract_text(value).unwrap(), "ab");
    }

    #[test]
    fn absent_candidates_is_missing_field() {
        let value = json!({ "promptFeedback": {} });
        match extract_text(value).unwrap_err() {
            SummaryError::MissingField { field } => assert_eq!(field, "candidates"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn empty_candidates_is_missing_field() {
        let value = json!({ "candidates": [] });
        assert!(matches!(
            extract_text(value).unwrap_err(),
            SummaryError::MissingField { .. }
        ));
    }

    #[test]
    fn absent_text_is_missing_field() {
        let value = json!({
            "candidates": [ { "content": { "parts": [ {} ] } } ]
        });
        match extract_text(value).unwrap_err() {
            SummaryError::MissingField { field } => assert_eq!(field, "text"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn wrong_typed_field_is_shape_error() {
        // candidates as a string instead of an array
        let value = json!({ "candidates": "not-an-array" });
        assert!(matches!(
            extract_text(value).unwrap_err(),
            SummaryError::Shape { .. }
        ));
    }

    #[test]
    fn from_env_without_key_is_typed() {
        // Save and restore the real key so this test never clobbers a
        // developer's environment.
        let saved = std::env::var(API_KEY_VAR).ok();
        std::env::remove_var(API_KEY_VAR);
        let result = GeminiClient::from_env("gemini-1.5-flash", 5);
        if let Some(k) = saved {
            std::env::set_var(API_KEY_VAR, k);
        }
        assert!(matches!(result, Err(Pdf2CsvError::ApiKeyMissing)));
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(300);
        assert!(snippet(&long).len() < 130);
        assert_eq!(snippet("short body"), "short body");
    }
}
