use super::{Services, Stage};
use crate::error::Result;
use crate::events::Event;
use crate::prompt::{battle_card_prompt, headline_list, CardFacts};
use crate::report::persist;
use crate::types::{PipelineState, PricingRecord, StageOutcome, StateUpdate};
use crate::PipelineError;
use async_trait::async_trait;
use tracing::{error, info};

pub const UNKNOWN: &str = "Unknown";
pub const NO_NEWS: &str = "No recent news available";

/// Writes the five-section battle card and persists it with its raw data.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterStage;

pub fn format_competitors(competitors: &[String]) -> String {
    if competitors.is_empty() {
        UNKNOWN.to_string()
    } else {
        competitors.join(", ")
    }
}

/// Bullet summary of the first pricing record, or `"Unknown"`.
pub fn format_pricing(pricing: Option<&PricingRecord>) -> String {
    let Some(record) = pricing else {
        return UNKNOWN.to_string();
    };
    let free_tier = if record.free_tier { "✅ Yes" } else { "❌ No" };
    let starter = record
        .starter_plan
        .as_ref()
        .and_then(|plan| plan.label())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let enterprise = if record.enterprise_plan {
        "✅ Available"
    } else {
        "❌ Not Available"
    };
    format!(
        "\n- **Free Tier:** {free_tier}\n- **Starter Plan:** {starter}\n- **Enterprise Plan:** {enterprise}\n"
    )
}

pub fn format_news(state: &PipelineState) -> String {
    if state.news_headlines.is_empty() {
        NO_NEWS.to_string()
    } else {
        headline_list(&state.news_headlines)
    }
}

/// Report shown in place of the battle card when writing fails.
pub fn error_banner(reason: &str) -> String {
    format!("# Error Generating Battle Card\n\nError: {reason}")
}

impl WriterStage {
    async fn write(&self, state: &PipelineState, services: &Services) -> Result<String> {
        let facts = CardFacts {
            company: &state.company_name,
            website: &state.home_url,
            description: &state.description,
            competitors: format_competitors(&state.competitors),
            pricing: format_pricing(state.pricing()),
            news: format_news(state),
        };

        let report = services.writer.complete(&battle_card_prompt(&facts)).await?;
        if report.trim().is_empty() {
            return Err(PipelineError::StageFailed {
                stage: self.name().to_string(),
                message: "model returned an empty report".to_string(),
            });
        }

        let artifacts = persist(&services.output_dir, state, &report).await?;
        info!(report = %artifacts.report.display(), "battle card saved");
        services.emit(Event::ArtifactWritten {
            path: artifacts.report,
        });
        services.emit(Event::ArtifactWritten {
            path: artifacts.data,
        });
        Ok(report)
    }
}

#[async_trait]
impl Stage for WriterStage {
    fn name(&self) -> &'static str {
        "writer"
    }

    async fn run(&self, state: &PipelineState, services: &Services) -> StageOutcome {
        let advanced = StateUpdate::advance(state);
        match self.write(state, services).await {
            Ok(report) => StageOutcome::Ok(StateUpdate {
                final_report: Some(report),
                ..advanced
            }),
            Err(e) => {
                error!(company = %state.company_name, error = %e, "battle card generation failed");
                StageOutcome::degraded(
                    StateUpdate {
                        final_report: Some(error_banner(&e.to_string())),
                        ..advanced
                    },
                    e.to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::testing::{services, FakeFetcher, FakeSearch};
    use crate::types::{Headline, StarterPlan};
    use std::sync::Arc;

    fn full_state() -> PipelineState {
        let mut state = PipelineState::new("Acme Co");
        state.home_url = "https://acme.test".into();
        state.description = "Makes anvils.".into();
        state.competitors = vec!["Globex".into(), "Initech".into()];
        state.pricing_info = vec![PricingRecord {
            free_tier: true,
            starter_plan: Some(StarterPlan {
                name: Some("Pro".into()),
                price: Some("$9/month".into()),
            }),
            enterprise_plan: false,
        }];
        state.news_headlines = vec![Headline { title: "Acme ships v2".into(), position: 1 }];
        state.loop_count = 3;
        state
    }

    #[test]
    fn test_format_helpers() {
        let state = full_state();
        assert_eq!(format_competitors(&state.competitors), "Globex, Initech");
        assert_eq!(format_competitors(&[]), "Unknown");
        assert_eq!(
            format_pricing(state.pricing()),
            "\n- **Free Tier:** ✅ Yes\n- **Starter Plan:** Pro: $9/month\n- **Enterprise Plan:** ❌ Not Available\n"
        );
        assert_eq!(format_pricing(None), "Unknown");
        assert_eq!(format_news(&state), "1. Acme ships v2");
        assert_eq!(format_news(&PipelineState::new("x")), NO_NEWS);
    }

    #[test]
    fn test_starter_without_price_is_unknown() {
        let record = PricingRecord {
            starter_plan: Some(StarterPlan { name: Some("Pro".into()), price: None }),
            ..PricingRecord::default()
        };
        assert!(format_pricing(Some(&record)).contains("**Starter Plan:** Unknown"));
    }

    #[tokio::test]
    async fn test_writer_persists_report_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockBackend::fixed("# Battle Card: Acme Co\n\n## 1. What They Do"));
        let services = services(llm.clone(), Arc::new(FakeSearch::returning("")), Arc::new(FakeFetcher::new()), dir.path());

        let outcome = WriterStage.run(&full_state(), &services).await;

        let StageOutcome::Ok(update) = outcome else {
            panic!("expected Ok, got {outcome:?}");
        };
        assert_eq!(update.final_report.as_deref(), Some("# Battle Card: Acme Co\n\n## 1. What They Do"));
        assert_eq!(update.loop_count, Some(4));
        assert!(dir.path().join("acme_co_battle_card.md").exists());
        assert!(dir.path().join("acme_co_data.json").exists());

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Competitors: Globex, Initech"));
        assert!(prompt.contains("Pro: $9/month"));
        assert!(prompt.contains("1. Acme ships v2"));
    }

    #[tokio::test]
    async fn test_writer_failure_yields_error_banner() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockBackend::failing("rate limit reached"));
        let services = services(llm, Arc::new(FakeSearch::returning("")), Arc::new(FakeFetcher::new()), dir.path());

        let outcome = WriterStage.run(&full_state(), &services).await;

        let report = outcome.update().final_report.clone().unwrap();
        assert!(report.starts_with("# Error Generating Battle Card\n\nError: "));
        assert!(report.contains("rate limit reached"));
        assert_eq!(outcome.update().loop_count, Some(4));
        assert!(!dir.path().join("acme_co_battle_card.md").exists());
    }

    #[tokio::test]
    async fn test_writer_empty_reply_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(MockBackend::fixed("   "));
        let services = services(llm, Arc::new(FakeSearch::returning("")), Arc::new(FakeFetcher::new()), dir.path());

        let outcome = WriterStage.run(&full_state(), &services).await;

        assert!(matches!(outcome, StageOutcome::Degraded { .. }));
        assert!(!outcome.update().final_report.as_ref().unwrap().trim().is_empty());
    }

    #[tokio::test]
    async fn test_writer_persist_failure_yields_error_banner() {
        let dir = tempfile::tempdir().unwrap();
        let occupied = dir.path().join("cards");
        std::fs::write(&occupied, "not a directory").unwrap();
        let llm = Arc::new(MockBackend::fixed("# Battle Card: Acme Co"));
        let services = services(llm, Arc::new(FakeSearch::returning("")), Arc::new(FakeFetcher::new()), &occupied);

        let outcome = WriterStage.run(&full_state(), &services).await;

        assert!(matches!(outcome, StageOutcome::Degraded { .. }));
        let report = outcome.update().final_report.clone().unwrap();
        assert!(report.starts_with("# Error Generating Battle Card\n\nError: I/O error"));
        assert_eq!(outcome.update().loop_count, Some(4));
    }
}
