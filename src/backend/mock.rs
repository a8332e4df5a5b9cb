//! Mock backend for running the pipeline without a live LLM.
//!
//! [`MockBackend`] returns pre-configured replies in order and records every
//! prompt it receives, so tests can assert on what each stage asked for.
//!
//! # Example
//!
//! ```
//! use battle_card::backend::MockBackend;
//!
//! let mock = MockBackend::new(vec![r#"{"website_url": "https://acme.test"}"#.to_string()]);
//! assert!(mock.prompts().is_empty());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::Result;
use crate::PipelineError;

/// A test backend that returns canned replies in order.
///
/// Cycles back to the beginning when all replies have been consumed.
/// An `Err` reply is surfaced as a provider failure.
#[derive(Debug)]
pub struct MockBackend {
    replies: Vec<std::result::Result<String, String>>,
    index: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Create a mock backend with the given canned responses.
    pub fn new(responses: Vec<String>) -> Self {
        Self::from_replies(responses.into_iter().map(Ok).collect())
    }

    /// Create a mock whose replies may include injected failures.
    pub fn from_replies(replies: Vec<std::result::Result<String, String>>) -> Self {
        assert!(!replies.is_empty(), "MockBackend requires at least one reply");
        Self {
            replies,
            index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Create a mock whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_replies(vec![Err(message.into())])
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    fn next_reply(&self) -> std::result::Result<String, String> {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.replies.len();
        self.replies[idx].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }
        match self.next_reply() {
            Ok(text) => Ok(LlmResponse { text, status: 200 }),
            Err(message) => Err(PipelineError::Other(message)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
