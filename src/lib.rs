//! # Battle Card
//!
//! Competitive battle cards for a named company, built by a fixed
//! four-stage pipeline over web search, page scraping, retrieval and an LLM.
//!
//! ## Pipeline
//!
//! 1. **Research** searches the web and extracts the official website, a
//!    one-line description and competitors.
//! 2. **Pricing** probes `/pricing`, `/plans`, `/price` under the website and
//!    extracts a [`PricingRecord`] from the first usable page.
//! 3. **News** probes `/blog`, `/news`, `/press`, `/updates` and extracts up
//!    to three headlines (five at most are kept).
//! 4. **Writer** turns the accumulated [`PipelineState`] into a five-section
//!    markdown battle card and saves it with a JSON sidecar.
//!
//! Every stage degrades instead of failing: a missing website, dead pages or
//! malformed model output leave the state at documented defaults and the run
//! continues. The writer always produces a report, falling back to an error
//! banner.
//!
//! ## Core Concepts
//!
//! - **[`BattleCardPipeline`]** drives one run over injected collaborators.
//! - **[`LlmClient`]** wraps a [`Backend`](backend::Backend) (Groq/OpenAI,
//!   Ollama or the test [`MockBackend`]) with an [`LlmConfig`].
//! - **[`WebSearch`]**, **[`TextFetcher`]** and **[`Retrieval`]** are the
//!   seams for search, page text and chunk ranking.
//! - **[`EventHandler`]** observes stage starts/ends, probes and artifacts.
//! - **[`BatchRunner`]** runs many companies from a CSV file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use battle_card::{AppConfig, BattleCardPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pipeline = BattleCardPipeline::builder()
//!         .llm(config.llm_client()?)
//!         .output_dir("cards")
//!         .build()?;
//!
//!     let state = pipeline.run("Slack").await?;
//!     println!("{}", state.final_report);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod llm;
pub mod parsing;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod retrieval;
pub mod search;
pub mod stages;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{MockBackend, OllamaBackend, OpenAiBackend};
pub use batch::{BatchReport, BatchRunner, CardGenerator, SummaryRow};
pub use client::LlmConfig;
pub use config::{AppConfig, EmbeddingProvider, Provider};
pub use error::{PipelineError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use fetch::{HttpFetcher, TextFetcher};
pub use llm::{LlmClient, LlmClientBuilder};
pub use pipeline::{BattleCardPipeline, BattleCardPipelineBuilder};
pub use retrieval::{Chunk, ChunkIndex, Embedder, LexicalEmbedder, OpenAiEmbedder, Retrieval, SemanticRetriever};
pub use search::{DuckDuckGoSearch, WebSearch};
pub use stages::{Services, Stage};
pub use types::{
    Headline, PipelineProgress, PipelineState, PricingRecord, StageOutcome, StarterPlan, StateUpdate,
    NOT_AVAILABLE, NOT_FOUND,
};
