use super::{candidate_urls, extract_json, is_usable, retrieve_context, Services, Stage};
use crate::events::Event;
use crate::prompt::news_prompt;
use crate::types::{null_default, Headline, PipelineState, StageOutcome, StateUpdate};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Path suffixes tried under the home page, in order.
pub const NEWS_PATHS: [&str; 4] = ["blog", "news", "press", "updates"];

/// Query the news page chunks are ranked against.
pub const NEWS_QUERY: &str = "blog headline article title news";

pub const NEWS_TOP_K: usize = 5;

/// Upper bound on headlines kept from one extraction.
pub const MAX_HEADLINES: usize = 5;

/// Extracts recent headlines from the first reachable blog or news page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsStage;

#[derive(Debug, Deserialize)]
struct HeadlineList {
    #[serde(default, deserialize_with = "null_default")]
    headlines: Vec<Headline>,
}

impl NewsStage {
    /// First candidate that answers 200 and has usable text, as `(url, text)`.
    async fn probe(&self, home_url: &str, services: &Services) -> Option<(String, String)> {
        for url in candidate_urls(home_url, &NEWS_PATHS) {
            match services.fetcher.probe_status(&url).await {
                Ok(200) => {}
                Ok(status) => {
                    debug!(url = %url, status, "news candidate unavailable");
                    self.report(services, &url, false);
                    continue;
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "news candidate unreachable");
                    self.report(services, &url, false);
                    continue;
                }
            }

            let text = services.fetcher.fetch_text(&url).await;
            let usable = is_usable(&text);
            self.report(services, &url, usable);
            if usable {
                return Some((url, text));
            }
        }
        None
    }

    fn report(&self, services: &Services, url: &str, usable: bool) {
        services.emit(Event::ProbeAttempt {
            stage: self.name(),
            url: url.to_string(),
            usable,
        });
    }
}

#[async_trait]
impl Stage for NewsStage {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn run(&self, state: &PipelineState, services: &Services) -> StageOutcome {
        let empty = StateUpdate {
            news_headlines: Some(Vec::new()),
            ..StateUpdate::advance(state)
        };

        let Some(home_url) = state.resolved_home_url() else {
            info!("no resolved website, skipping news");
            return StageOutcome::degraded(empty, "no resolved website");
        };

        let Some((url, text)) = self.probe(home_url, services).await else {
            warn!(home_url = %home_url, "no usable news page");
            return StageOutcome::degraded(empty, "no usable news page");
        };

        let context = match retrieve_context(services.retrieval.as_ref(), &text, NEWS_QUERY, NEWS_TOP_K).await {
            Ok(Some(context)) => context,
            Ok(None) => return StageOutcome::degraded(empty, "news page could not be indexed"),
            Err(e) => {
                warn!(url = %url, error = %e, "news retrieval failed");
                return StageOutcome::degraded(empty, format!("retrieval failed: {e}"));
            }
        };

        let mut headlines = match extract_json::<HeadlineList>(&services.extractor, &news_prompt(&context)).await {
            Ok(list) => list.headlines,
            Err(e) => {
                warn!(url = %url, error = %e, "headline extraction failed");
                return StageOutcome::degraded(empty, format!("extraction failed: {e}"));
            }
        };
        headlines.retain(|h| !h.title.trim().is_empty());
        headlines.truncate(MAX_HEADLINES);
        for (i, headline) in headlines.iter_mut().enumerate() {
            if headline.position == 0 {
                headline.position = i as u32 + 1;
            }
        }

        info!(url = %url, headlines = headlines.len(), "news extracted");
        StageOutcome::Ok(StateUpdate {
            news_headlines: Some(headlines),
            ..empty
        })
    }
}
