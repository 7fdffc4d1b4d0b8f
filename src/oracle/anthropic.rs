//! Hosted oracle via the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{OracleError, OracleReply, OracleRequest, SizeOracle};

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Oracle backed by the Anthropic Messages API.
pub struct AnthropicOracle {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicOracle {
    /// `api_key` falls back to `ANTHROPIC_API_KEY`.
    pub fn new(api_key: Option<String>, model: Option<String>) -> Result<Self, OracleError> {
        let api_key = api_key
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OracleError::Unavailable("ANTHROPIC_API_KEY not set".to_string()))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            endpoint: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Point at a different Messages-compatible endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, request: &OracleRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "max_tokens": 500,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": request.prompt()
            }]
        })
    }
}

#[async_trait]
impl SizeOracle for AnthropicOracle {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn propose(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        tracing::debug!("Consulting {} via Messages API", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let api_response: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let content = api_response["content"][0]["text"]
            .as_str()
            .ok_or_else(|| OracleError::Malformed("Invalid API response".to_string()))?;

        OracleReply::parse(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_is_used() {
        let oracle = AnthropicOracle::new(Some("sk-test".to_string()), None).unwrap();
        assert_eq!(oracle.api_key, "sk-test");
        assert_eq!(oracle.model, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn blank_key_is_rejected() {
        // An explicit blank key never falls through to the environment.
        let result = AnthropicOracle::new(Some("  ".to_string()), None);
        assert!(matches!(result, Err(OracleError::Unavailable(_))));
    }

    #[test]
    fn request_body_carries_prompt() {
        let oracle = AnthropicOracle::new(Some("k".to_string()), Some("m".to_string())).unwrap();
        let request = OracleRequest {
            report: "SIZE 20.0".to_string(),
            body_size: 10.0,
        };
        let body = oracle.request_body(&request);
        assert_eq!(body["model"], "m");
        assert!(body["messages"][0]["content"].as_str().unwrap().contains("SIZE 20.0"));
    }
}
