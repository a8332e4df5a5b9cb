//! Backend trait and normalized request/response types.
//!
//! The [`Backend`] trait abstracts over LLM providers, translating between
//! normalized [`LlmRequest`]/[`LlmResponse`] types and provider-specific
//! HTTP APIs. Built-in implementations: [`OpenAiBackend`] (Groq, OpenAI and
//! other compatible hosts), [`OllamaBackend`], and [`MockBackend`] for tests.
//!
//! ## Architecture
//!
//! ```text
//! LlmClient ──► LlmRequest ──► Backend::complete() ──► LlmResponse
//!                                     │
//!                       ┌─────────────┼─────────────┐
//!                 OpenAiBackend  OllamaBackend  MockBackend
//!            /v1/chat/completions  /api/generate   canned replies
//! ```

pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::client::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// A normalized, provider-agnostic LLM request.
///
/// [`LlmClient`](crate::llm::LlmClient) builds this from its config.
/// The [`Backend`] translates it into the provider-specific HTTP request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Model identifier (e.g. `"llama-3.1-8b-instant"`).
    pub model: String,

    /// The user prompt text.
    pub prompt: String,

    /// LLM configuration (temperature, max_tokens, json_mode).
    pub config: LlmConfig,
}

/// A normalized LLM response.
#[derive(Debug)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code, logged by the client.
    pub status: u16,
}

/// Abstraction over LLM providers.
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a single non-streaming completion.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
