use super::{candidate_urls, extract_json, is_usable, retrieve_context, Services, Stage};
use crate::events::Event;
use crate::prompt::pricing_prompt;
use crate::types::{PipelineState, PricingRecord, StageOutcome, StateUpdate};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Path suffixes tried under the home page, in order.
pub const PRICING_PATHS: [&str; 3] = ["pricing", "plans", "price"];

/// Query the pricing page chunks are ranked against.
pub const PRICING_QUERY: &str = "price $ or ₹";

pub const PRICING_TOP_K: usize = 3;

/// Extracts a [`PricingRecord`] from the first usable pricing page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingStage;

impl PricingStage {
    /// First candidate page with usable text, as `(url, text)`.
    async fn probe(&self, home_url: &str, services: &Services) -> Option<(String, String)> {
        for url in candidate_urls(home_url, &PRICING_PATHS) {
            let text = services.fetcher.fetch_text(&url).await;
            let usable = is_usable(&text);
            debug!(url = %url, usable, "pricing candidate");
            services.emit(Event::ProbeAttempt {
                stage: self.name(),
                url: url.clone(),
                usable,
            });
            if usable {
                return Some((url, text));
            }
        }
        None
    }
}

#[async_trait]
impl Stage for PricingStage {
    fn name(&self) -> &'static str {
        "pricing"
    }

    async fn run(&self, state: &PipelineState, services: &Services) -> StageOutcome {
        let unchanged = StateUpdate::advance(state);

        let Some(home_url) = state.resolved_home_url() else {
            info!("no resolved website, skipping pricing");
            return StageOutcome::degraded(unchanged, "no resolved website");
        };

        let Some((url, text)) = self.probe(home_url, services).await else {
            warn!(home_url = %home_url, "no usable pricing page");
            return StageOutcome::degraded(unchanged, "no usable pricing page");
        };

        let context = match retrieve_context(services.retrieval.as_ref(), &text, PRICING_QUERY, PRICING_TOP_K).await {
            Ok(Some(context)) => context,
            Ok(None) => return StageOutcome::degraded(unchanged, "pricing page could not be indexed"),
            Err(e) => {
                warn!(url = %url, error = %e, "pricing retrieval failed");
                return StageOutcome::degraded(unchanged, format!("retrieval failed: {e}"));
            }
        };

        let record: PricingRecord = match extract_json(&services.extractor, &pricing_prompt(&context)).await {
            Ok(record) => record,
            Err(e) => {
                warn!(url = %url, error = %e, "pricing extraction failed");
                return StageOutcome::degraded(unchanged, format!("extraction failed: {e}"));
            }
        };

        info!(url = %url, free_tier = record.free_tier, enterprise = record.enterprise_plan, "pricing extracted");
        let mut pricing_info = state.pricing_info.clone();
        pricing_info.push(record);
        StageOutcome::Ok(StateUpdate {
            pricing_info: Some(pricing_info),
            ..unchanged
        })
    }
}
