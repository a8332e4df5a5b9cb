use crate::{
    error::Result,
    events::{Event, EventHandler},
    fetch::{HttpFetcher, TextFetcher},
    llm::LlmClient,
    retrieval::{Retrieval, SemanticRetriever},
    search::{DuckDuckGoSearch, WebSearch},
    stages::{NewsStage, PricingStage, ResearchStage, Services, Stage, WriterStage},
    types::{PipelineProgress, PipelineState, StageOutcome},
    LlmConfig, PipelineError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// Fixed research → pricing → news → writer pipeline.
///
/// Stages run strictly in order; each stage's update is merged into the
/// shared [`PipelineState`] before the next one starts. Stages degrade
/// instead of failing, so a run always ends with a non-empty `final_report`.
///
/// # Example
///
/// ```no_run
/// use battle_card::{BattleCardPipeline, LlmClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let llm = LlmClient::builder("https://api.groq.com/openai").build()?;
///     let pipeline = BattleCardPipeline::builder().llm(llm).build()?;
///     let state = pipeline.run("Slack").await?;
///     println!("{}", state.final_report);
///     Ok(())
/// }
/// ```
pub struct BattleCardPipeline {
    stages: Vec<Box<dyn Stage>>,
    services: Services,
}

impl std::fmt::Debug for BattleCardPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleCardPipeline")
            .field("stages", &self.stage_names())
            .field("services", &self.services)
            .finish()
    }
}

impl BattleCardPipeline {
    pub fn builder() -> BattleCardPipelineBuilder {
        BattleCardPipelineBuilder::default()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Generate a battle card for `company`.
    pub async fn run(&self, company: &str) -> Result<PipelineState> {
        self.run_with_progress(company, |_| {}).await
    }

    /// Generate a battle card, calling `on_progress` as each stage starts.
    pub async fn run_with_progress<F>(&self, company: &str, mut on_progress: F) -> Result<PipelineState>
    where
        F: FnMut(PipelineProgress),
    {
        let company = company.trim();
        if company.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "company name must not be empty".to_string(),
            ));
        }

        let mut state = PipelineState::new(company);
        let total_stages = self.stages.len();
        info!(company = %company, "starting battle card generation");

        for (stage_index, stage) in self.stages.iter().enumerate() {
            on_progress(PipelineProgress {
                stage_index,
                total_stages,
                stage_name: stage.name().to_string(),
            });
            self.services.emit(Event::StageStart { stage: stage.name() });

            let outcome = stage
                .run(&state, &self.services)
                .instrument(info_span!("stage", name = stage.name()))
                .await;

            let degraded = match &outcome {
                StageOutcome::Ok(_) => {
                    info!(stage = stage.name(), "stage complete");
                    None
                }
                StageOutcome::Degraded { reason, .. } => {
                    warn!(stage = stage.name(), reason = %reason, "stage degraded");
                    Some(reason.clone())
                }
            };
            state.apply(outcome.into_update());
            self.services.emit(Event::StageEnd {
                stage: stage.name(),
                degraded,
            });
        }

        info!(company = %company, stages = state.loop_count, "battle card generation complete");
        Ok(state)
    }
}

/// Builder for [`BattleCardPipeline`].
///
/// Only the LLM client is required. Search, fetching and retrieval default
/// to DuckDuckGo, [`HttpFetcher`] and a lexical [`SemanticRetriever`].
#[derive(Default)]
pub struct BattleCardPipelineBuilder {
    llm: Option<LlmClient>,
    writer: Option<LlmClient>,
    search: Option<Arc<dyn WebSearch>>,
    fetcher: Option<Arc<dyn TextFetcher>>,
    retrieval: Option<Arc<dyn Retrieval>>,
    output_dir: Option<PathBuf>,
    events: Option<Arc<dyn EventHandler>>,
}

impl BattleCardPipelineBuilder {
    /// LLM used for extraction. Its config is replaced with
    /// [`LlmConfig::extraction`]; the writer gets [`LlmConfig::writer`]
    /// over the same model unless [`writer`](Self::writer) is set.
    pub fn llm(mut self, llm: LlmClient) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Override the writer client.
    pub fn writer(mut self, writer: LlmClient) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn TextFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn retrieval(mut self, retrieval: Arc<dyn Retrieval>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    /// Directory for report artifacts. Default: the current directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn events(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events = Some(handler);
        self
    }

    pub fn build(self) -> Result<BattleCardPipeline> {
        let llm = self.llm.ok_or_else(|| {
            PipelineError::InvalidConfig("an LLM client is required".to_string())
        })?;
        let extractor = llm.with_config(LlmConfig::extraction());
        let writer = self
            .writer
            .unwrap_or_else(|| llm.with_config(LlmConfig::writer()));

        let search: Arc<dyn WebSearch> = match self.search {
            Some(search) => search,
            None => Arc::new(DuckDuckGoSearch::new()?),
        };
        let fetcher: Arc<dyn TextFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()?),
        };
        let retrieval: Arc<dyn Retrieval> = match self.retrieval {
            Some(retrieval) => retrieval,
            None => Arc::new(SemanticRetriever::lexical()),
        };

        Ok(BattleCardPipeline {
            stages: vec![
                Box::new(ResearchStage),
                Box::new(PricingStage),
                Box::new(NewsStage),
                Box::new(WriterStage),
            ],
            services: Services {
                search,
                fetcher,
                retrieval,
                extractor,
                writer,
                output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
                events: self.events,
            },
        })
    }
}
