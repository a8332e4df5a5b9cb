//! Backend for a local Ollama server.
//!
//! [`OllamaBackend`] sends every request to `/api/generate` with
//! `stream: false`; JSON mode maps to `format: "json"`.

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for Ollama's native generate API.
#[derive(Debug, Clone)]
pub struct OllamaBackend;

impl OllamaBackend {
    /// Build the JSON body for `/api/generate`.
    fn build_generate_body(request: &LlmRequest) -> Value {
        let mut body = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.config.temperature,
                "num_predict": request.config.max_tokens,
            },
        });
        if request.config.json_mode {
            body["format"] = json!("json");
        }
        body
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = Self::build_generate_body(request);

        let resp = client.post(&url).json(&body).send().await.map_err(|e| {
            PipelineError::Other(format!("Failed to connect to LLM at {}: {}", url, e))
        })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError { status, body: text });
        }

        let json_resp: Value = resp.json().await?;
        let text = json_resp
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(LlmResponse { text, status })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "llama3.1:8b".into(),
            prompt: "Who competes with Acme?".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_ollama_generate_payload() {
        let body = OllamaBackend::build_generate_body(&test_request());

        assert_eq!(body["model"], "llama3.1:8b");
        assert_eq!(body["prompt"], "Who competes with Acme?");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.7);
        assert_eq!(body["options"]["num_predict"], 2048);
        assert!(body.get("format").is_none());
    }

    #[test]
    fn test_ollama_extraction_requests_json_format() {
        let mut request = test_request();
        request.config = LlmConfig::extraction();

        let body = OllamaBackend::build_generate_body(&request);
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["temperature"], 0.0);
    }
}
