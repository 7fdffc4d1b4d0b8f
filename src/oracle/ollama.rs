//! Local model oracle via Ollama's `/api/chat`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{OracleError, OracleReply, OracleRequest, SizeOracle};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5:14b";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Oracle backed by a local Ollama server.
pub struct OllamaOracle {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaOracle {
    /// `base_url` falls back to `OLLAMA_HOST`, then [`DEFAULT_OLLAMA_URL`].
    pub fn new(base_url: Option<String>, model: Option<String>) -> Result<Self, OracleError> {
        let base_url = base_url
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{base_url}")
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
        })
    }

    fn request_body(&self, request: &OracleRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": request.prompt()
            }],
            "stream": false,
            "format": OracleRequest::reply_schema(),
            "options": { "temperature": 0 }
        })
    }
}

#[async_trait]
impl SizeOracle for OllamaOracle {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn propose(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!("Consulting {} at {url}", self.model);

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(format!("unexpected Ollama response: {e}")))?;

        OracleReply::parse(&chat.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_base_url() {
        let oracle = OllamaOracle::new(Some("localhost:11434/".to_string()), None).unwrap();
        assert_eq!(oracle.base_url, "http://localhost:11434");
        assert_eq!(oracle.model, DEFAULT_OLLAMA_MODEL);
    }

    #[test]
    fn request_body_is_deterministic_json_chat() {
        let oracle = OllamaOracle::new(Some(DEFAULT_OLLAMA_URL.to_string()), Some("llama3".to_string())).unwrap();
        let request = OracleRequest {
            report: "SIZE 18.0 [HEADER?]".to_string(),
            body_size: 11.0,
        };
        let body = oracle.request_body(&request);

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0);
        assert!(body["messages"][0]["content"].as_str().unwrap().contains("SIZE 18.0"));
        assert_eq!(body["format"]["type"], "object");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        // Port 9 (discard) is closed on test hosts.
        let oracle = OllamaOracle::new(Some("http://127.0.0.1:9".to_string()), None).unwrap();
        let request = OracleRequest {
            report: String::new(),
            body_size: 12.0,
        };
        assert!(oracle.propose(&request).await.is_err());
    }
}
