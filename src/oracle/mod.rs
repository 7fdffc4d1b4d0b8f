//! External language-model oracle for header font sizes.
//!
//! The oracle reads the font report and proposes which sizes mark topic
//! headers. Its replies are hints only: [`OracleReply`] keeps whatever
//! numbers it could read and the caller validates them against the font
//! profile before use.
//!
//! Backends:
//! - [`OllamaOracle`]: local model via `/api/chat` with a JSON schema
//! - [`AnthropicOracle`]: Messages API

pub mod anthropic;
pub mod ollama;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use anthropic::AnthropicOracle;
pub use ollama::OllamaOracle;
pub use prompt::OracleRequest;

/// Oracle failures. Always recovered by the classifier.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Oracle returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed oracle reply: {0}")]
    Malformed(String),

    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}

/// Which oracle backend to consult.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    /// Heuristic only
    #[default]
    None,
    /// Local Ollama server
    Ollama,
    /// Anthropic Messages API
    Anthropic,
}

/// Proposes header font sizes for a font report.
#[async_trait]
pub trait SizeOracle: Send + Sync {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// One round trip. No retries, no timeout: the classifier owns both.
    async fn propose(&self, request: &OracleRequest) -> Result<OracleReply, OracleError>;
}

/// Parsed oracle answer, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OracleReply {
    /// Numeric entries of `target_font_sizes`, in reply order.
    pub sizes: Vec<f32>,
    /// Entries that were not numbers.
    pub dropped: usize,
    pub reasoning: String,
}

impl OracleReply {
    /// Parse `{ "target_font_sizes": [...], "reasoning": "..." }` from raw
    /// model text.
    ///
    /// Markdown code fences and prose around the object are tolerated.
    /// Numbers and numeric strings are kept; any other entry is counted in
    /// `dropped`.
    pub fn parse(text: &str) -> Result<Self, OracleError> {
        let json_text = extract_json_object(text)
            .ok_or_else(|| OracleError::Malformed(format!("no JSON object in reply: {}", preview(text))))?;

        let value: serde_json::Value = serde_json::from_str(json_text)
            .map_err(|e| OracleError::Malformed(format!("invalid JSON ({e}): {}", preview(text))))?;

        let entries = value
            .get("target_font_sizes")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| OracleError::Malformed("missing `target_font_sizes` array".to_string()))?;

        let mut sizes = Vec::with_capacity(entries.len());
        let mut dropped = 0;
        for entry in entries {
            let number = match entry {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match number.filter(|n| n.is_finite()) {
                Some(n) => sizes.push(n as f32),
                None => dropped += 1,
            }
        }

        let reasoning = value
            .get("reasoning")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            sizes,
            dropped,
            reasoning,
        })
    }
}

/// Locate the outermost `{...}` span. Markdown fences and prose around it
/// fall outside the span.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}
