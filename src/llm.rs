//! LLM client shared by the pipeline stages.
//!
//! [`LlmClient`] carries the HTTP client, backend, base URL, model identity
//! and [`LlmConfig`]. The pipeline holds two of them over the same model: a
//! deterministic one for extraction and a creative one for the writer. The
//! second is derived from the first with [`LlmClient::with_config`].

use crate::backend::{Backend, LlmRequest, OpenAiBackend};
use crate::client::LlmConfig;
use crate::error::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default model, served by Groq.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Handle for issuing `complete(prompt)` calls against one model.
///
/// Cheap to clone; the HTTP client and backend are reference-counted.
///
/// # Example
///
/// ```
/// use battle_card::LlmClient;
///
/// let client = LlmClient::builder("https://api.groq.com/openai/v1")
///     .model("llama-3.1-8b-instant")
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url(), "https://api.groq.com/openai");
/// ```
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    backend: Arc<dyn Backend>,
    model: String,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> LlmClientBuilder {
        LlmClientBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            model: DEFAULT_MODEL.to_string(),
            config: LlmConfig::extraction(),
            timeout: None,
        }
    }

    /// A client sharing this one's transport and model with a different config.
    pub fn with_config(&self, config: LlmConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Send `prompt` to the model and return the raw completion text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = LlmRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            config: self.config.clone(),
        };
        debug!(
            backend = self.backend.name(),
            model = %self.model,
            temperature = self.config.temperature,
            prompt_chars = prompt.len(),
            "sending completion request"
        );
        let response = self
            .backend
            .complete(&self.client, &self.base_url, &request)
            .await?;
        debug!(status = response.status, chars = response.text.len(), "completion received");
        Ok(response.text)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`LlmClient`].
pub struct LlmClientBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    model: String,
    config: LlmConfig,
    timeout: Option<Duration>,
}

impl LlmClientBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the LLM backend. Default: [`OpenAiBackend`] without a key.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the LLM configuration. Default: [`LlmConfig::extraction`].
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the request timeout. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is provided via `.client()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<LlmClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
                .build()?,
        };
        Ok(LlmClient {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend: match self.backend {
                Some(backend) => backend,
                None => Arc::new(OpenAiBackend::new()),
            },
            model: self.model,
            config: self.config,
        })
    }
}

/// Strip known provider path suffixes from a base URL.
/// This prevents double-pathing when backends append their own paths.
/// e.g., "https://api.groq.com/openai/v1" -> "https://api.groq.com/openai"
/// e.g., "http://localhost:11434/api" -> "http://localhost:11434"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // Longest first
    for suffix in &["/v1/chat/completions", "/v1/chat", "/v1", "/api/generate", "/api"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("https://api.groq.com/openai/v1"), "https://api.groq.com/openai");
        assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com");
        assert_eq!(normalize_base_url("http://localhost:11434/api/"), "http://localhost:11434");
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1/chat/completions"),
            "https://api.openai.com"
        );
        assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
    }

    #[test]
    fn test_with_config_shares_model_identity() {
        let extractor = LlmClient::builder("http://unused")
            .model("llama-3.1-8b-instant")
            .build()
            .unwrap();
        let writer = extractor.with_config(LlmConfig::writer());

        assert_eq!(extractor.model(), writer.model());
        assert_eq!(extractor.config().temperature, 0.0);
        assert_eq!(writer.config().temperature, 0.7);
        assert_eq!(writer.backend_name(), "openai");
    }

    #[tokio::test]
    async fn test_complete_goes_through_backend() {
        let mock = Arc::new(MockBackend::fixed("pong"));
        let client = LlmClient::builder("http://unused")
            .backend(mock.clone())
            .build()
            .unwrap();

        assert_eq!(client.complete("ping").await.unwrap(), "pong");
        assert_eq!(mock.prompts(), vec!["ping"]);
    }
}
