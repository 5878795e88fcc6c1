//! Local model server gateway (Ollama HTTP API).
//!
//! [`ModelGateway`] is the seam the analysis cascade talks to; the
//! production implementation is [`OllamaClient`]. Availability and model
//! listing are best-effort and never fail. Generation returns a
//! discriminated [`GenerateError`] instead of folding failures into the
//! generated text.
//!
//! # Endpoints
//!
//! | Method | Path | Use |
//! |--------|------|-----|
//! | `GET`  | `/api/tags` | availability probe and loaded-model listing |
//! | `POST` | `/api/generate` | single-shot, non-streaming generation |

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ModelsConfig;

/// Why a generation call produced no usable text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerateError {
    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model server request failed: {0}")]
    Transport(String),

    #[error("model server returned no response text")]
    EmptyResponse,
}

/// Operations the analysis cascade needs from a model server.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Short-timeout probe. Any failure means "unavailable".
    async fn is_available(&self) -> bool;

    /// Names of the currently loaded models; empty on failure.
    async fn list_models(&self) -> Vec<String>;

    /// Runs one generation with the gateway's fixed decoding parameters.
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

/// [`ModelGateway`] backed by an Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    url: String,
    probe_timeout: Duration,
    generate_timeout: Duration,
    temperature: f64,
    top_p: f64,
}

impl OllamaClient {
    pub fn new(config: &ModelsConfig) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            generate_timeout: Duration::from_secs(config.generate_timeout_secs),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_tags(&self) -> Option<TagsResponse> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.url))
            .timeout(self.probe_timeout)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<TagsResponse>().await.ok()
    }
}

#[async_trait]
impl ModelGateway for OllamaClient {
    async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.url))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "model server probe failed");
                false
            }
        }
    }

    async fn list_models(&self) -> Vec<String> {
        self.fetch_tags()
            .await
            .map(|tags| tags.models.into_iter().map(|m| m.name).collect())
            .unwrap_or_default()
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<String, GenerateError> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .timeout(self.generate_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Transport(e.to_string()))?;

        match parsed.response {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerateError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_shape() {
        let body = GenerateRequest {
            model: "codellama:7b",
            prompt: "hi",
            stream: false,
            options: GenerateOptions {
                num_predict: 3000,
                temperature: 0.1,
                top_p: 0.9,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "codellama:7b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 3000);
        assert_eq!(json["options"]["top_p"], 0.9);
    }

    #[tokio::test]
    async fn test_unreachable_server_degrades() {
        let config = ModelsConfig {
            url: "http://127.0.0.1:9".to_string(),
            probe_timeout_secs: 1,
            generate_timeout_secs: 1,
            ..ModelsConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert!(!client.is_available().await);
        assert!(client.list_models().await.is_empty());
        let err = client.generate("p", "m", 10).await.unwrap_err();
        assert!(matches!(err, GenerateError::Transport(_)));
    }
}
