//! The four pipeline stages and the collaborators they share.
//!
//! Every stage reads the accumulated [`PipelineState`] and returns a
//! [`StageOutcome`]. A stage never returns an error: failures become a
//! `Degraded` outcome carrying the stage's documented default update.

pub mod news;
pub mod pricing;
pub mod research;
pub mod writer;

pub use news::NewsStage;
pub use pricing::PricingStage;
pub use research::ResearchStage;
pub use writer::WriterStage;

use crate::error::Result;
use crate::events::{emit, Event, EventHandler};
use crate::fetch::{is_error_marker, TextFetcher};
use crate::llm::LlmClient;
use crate::parsing::parse_json;
use crate::retrieval::{join_chunks, Retrieval};
use crate::search::WebSearch;
use crate::types::{PipelineState, StageOutcome};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Pages with this many characters or fewer are treated as empty shells.
pub const MIN_USABLE_CHARS: usize = 100;

/// External collaborators injected into every stage.
#[derive(Clone)]
pub struct Services {
    pub search: Arc<dyn WebSearch>,
    pub fetcher: Arc<dyn TextFetcher>,
    pub retrieval: Arc<dyn Retrieval>,
    /// Deterministic client for JSON extraction.
    pub extractor: LlmClient,
    /// Creative client for the final report.
    pub writer: LlmClient,
    /// Directory the writer persists artifacts into.
    pub output_dir: PathBuf,
    pub events: Option<Arc<dyn EventHandler>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("extractor", &self.extractor)
            .field("writer", &self.writer)
            .field("output_dir", &self.output_dir)
            .field("has_events", &self.events.is_some())
            .finish()
    }
}

impl Services {
    pub(crate) fn emit(&self, event: Event) {
        emit(&self.events, event);
    }
}

/// One step of the battle card pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &PipelineState, services: &Services) -> StageOutcome;
}

/// Run the strict-JSON extraction pattern: prompt, strip fences, parse.
pub(crate) async fn extract_json<T: DeserializeOwned>(llm: &LlmClient, prompt: &str) -> Result<T> {
    let raw = llm.complete(prompt).await?;
    parse_json(&raw)
}

/// `home_url` joined with each suffix as a child path.
///
/// ```text
/// https://acme.test      + pricing -> https://acme.test/pricing
/// https://acme.test/app/ + plans   -> https://acme.test/app/plans
/// ```
pub fn candidate_urls(home_url: &str, suffixes: &[&str]) -> Vec<String> {
    let base = format!("{}/", home_url.trim_end_matches('/'));
    let parsed = Url::parse(&base).ok();
    suffixes
        .iter()
        .map(|suffix| match parsed.as_ref().and_then(|b| b.join(suffix).ok()) {
            Some(url) => url.to_string(),
            None => format!("{base}{suffix}"),
        })
        .collect()
}

/// Whether fetched page text is worth extracting from.
pub fn is_usable(text: &str) -> bool {
    !is_error_marker(text) && text.chars().count() > MIN_USABLE_CHARS
}

/// Index `text`, retrieve the `k` chunks closest to `query`, and join them.
///
/// `Ok(None)` when the text could not be indexed.
pub(crate) async fn retrieve_context(
    retrieval: &dyn Retrieval,
    text: &str,
    query: &str,
    k: usize,
) -> Result<Option<String>> {
    let Some(index) = retrieval.chunk_and_embed(text).await? else {
        return Ok(None);
    };
    let chunks = retrieval.top_k_similar(&index, query, k).await?;
    debug!(indexed = index.len(), selected = chunks.len(), "context retrieved");
    Ok(Some(join_chunks(&chunks)))
}
