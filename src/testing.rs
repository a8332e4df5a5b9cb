//! Fakes shared by unit tests across modules.

use crate::backend::MockBackend;
use crate::error::Result;
use crate::fetch::TextFetcher;
use crate::llm::LlmClient;
use crate::retrieval::{Chunk, ChunkIndex, Retrieval, SemanticRetriever};
use crate::search::WebSearch;
use crate::stages::Services;
use crate::PipelineError;
use crate::LlmConfig;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Search returning one canned reply and recording queries.
pub struct FakeSearch {
    reply: std::result::Result<String, String>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        self.reply.clone().map_err(PipelineError::Other)
    }
}

/// Fetcher serving fixed pages by URL. Unknown URLs are 404s.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    statuses: HashMap<String, u16>,
    unreachable: HashSet<String>,
    fetched: Mutex<Vec<String>>,
    probed: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` at `url` with status 200.
    pub fn page(mut self, url: &str, text: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), text.into());
        self
    }

    /// Override the status `probe_status` reports for `url`.
    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    /// Make `probe_status` fail for `url` as if the connection was refused.
    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.fetched().len() + self.probed().len()
    }
}

#[async_trait]
impl TextFetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str) -> String {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "Error: Status code 404".to_string())
    }

    async fn probe_status(&self, url: &str) -> Result<u16> {
        self.probed.lock().unwrap().push(url.to_string());
        if self.unreachable.contains(url) {
            return Err(PipelineError::Other(format!("connection refused: {url}")));
        }
        if let Some(status) = self.statuses.get(url) {
            return Ok(*status);
        }
        Ok(if self.pages.contains_key(url) { 200 } else { 404 })
    }
}

/// Retrieval that never yields context: either nothing to index or an error.
pub struct FakeRetrieval {
    failure: Option<String>,
}

impl FakeRetrieval {
    /// `chunk_and_embed` answers `Ok(None)`.
    pub fn unindexable() -> Self {
        Self { failure: None }
    }

    /// `chunk_and_embed` fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl Retrieval for FakeRetrieval {
    async fn chunk_and_embed(&self, _text: &str) -> Result<Option<ChunkIndex>> {
        match &self.failure {
            Some(message) => Err(PipelineError::Other(message.clone())),
            None => Ok(None),
        }
    }

    async fn top_k_similar(&self, _index: &ChunkIndex, _query: &str, _k: usize) -> Result<Vec<Chunk>> {
        Ok(Vec::new())
    }
}

/// `n` characters of plausible page text.
pub fn page_text(topic: &str, n: usize) -> String {
    let sentence = format!("{topic} details for every team. ");
    sentence.repeat(n / sentence.len() + 1).chars().take(n).collect()
}

/// Services wired to fakes, writing artifacts under `dir`.
pub fn services(
    llm: Arc<MockBackend>,
    search: Arc<FakeSearch>,
    fetcher: Arc<FakeFetcher>,
    dir: &Path,
) -> Services {
    let extractor = LlmClient::builder("http://llm.invalid")
        .backend(llm)
        .build()
        .unwrap();
    Services {
        search,
        fetcher,
        retrieval: Arc::new(SemanticRetriever::lexical()),
        writer: extractor.with_config(LlmConfig::writer()),
        extractor,
        output_dir: dir.to_path_buf(),
        events: None,
    }
}
