//! Narrative text generation over an Ollama-compatible HTTP API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Text substituted for the narrative when generation fails.
pub const GENERATION_FAILED_TEXT: &str = "Error generating LLM report";

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("text generation backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("text generation backend returned HTTP {0}")]
    Status(StatusCode),
    #[error("text generation backend returned an unexpected body: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, GenerateError>;

    /// Raw model listing from the backend.
    async fn list_models(&self) -> Result<serde_json::Value, GenerateError>;
}

/// Generated text, or the failure sentinel with `ok == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    pub ok: bool,
}

impl Narrative {
    pub fn failed() -> Self {
        Self {
            text: GENERATION_FAILED_TEXT.to_string(),
            ok: false,
        }
    }
}

/// Runs one generation and folds any failure into the sentinel narrative.
pub async fn narrate(
    generator: &dyn TextGenerator,
    prompt: &str,
    model: &str,
    timeout: Duration,
) -> Narrative {
    match generator.generate(prompt, model, timeout).await {
        Ok(text) => Narrative { text, ok: true },
        Err(err) => {
            tracing::warn!(model, error = %err, "narrative generation failed");
            Narrative::failed()
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Clone)]
pub struct OllamaGenerator {
    base_url: String,
    http: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(base_url: String, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, GenerateError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
        });
        let resp = self
            .http
            .post(url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GenerateError::Status(resp.status()));
        }
        let parsed: GenerateResponse = resp.json().await?;
        parsed
            .response
            .ok_or_else(|| GenerateError::Malformed("missing 'response' field".to_string()))
    }

    async fn list_models(&self) -> Result<serde_json::Value, GenerateError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .http
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GenerateError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedGenerator;

    #[tokio::test]
    async fn narrate_passes_text_through() {
        let generator = CannedGenerator::replying("Average CO2 levels were 833 ppm.");
        let narrative = narrate(&generator, "prompt", "llama3.1", Duration::from_secs(1)).await;
        assert!(narrative.ok);
        assert_eq!(narrative.text, "Average CO2 levels were 833 ppm.");
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn narrate_substitutes_sentinel_on_failure() {
        let generator = CannedGenerator::failing();
        let narrative = narrate(&generator, "prompt", "llama3.1", Duration::from_secs(1)).await;
        assert!(!narrative.ok);
        assert_eq!(narrative.text, GENERATION_FAILED_TEXT);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) on loopback is not expected to run an HTTP server.
        let generator = OllamaGenerator::new("http://127.0.0.1:9/".to_string(), reqwest::Client::new());
        assert_eq!(generator.base_url(), "http://127.0.0.1:9");
        let err = generator
            .generate("hello", "llama3.1", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Transport(_)));
    }
}
