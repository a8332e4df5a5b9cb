use super::{extract_json, Services, Stage};
use crate::prompt::research_prompt;
use crate::types::{null_default, PipelineState, StageOutcome, StateUpdate, NOT_AVAILABLE, NOT_FOUND};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

/// Finds the company's website, a one-line description and its competitors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResearchStage;

#[derive(Debug, Deserialize)]
struct ResearchFindings {
    #[serde(default)]
    website_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    competitors: Vec<String>,
}

/// `Some(trimmed)` unless missing or blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn search_query(company: &str) -> String {
    format!("{company} official website competitors")
}

#[async_trait]
impl Stage for ResearchStage {
    fn name(&self) -> &'static str {
        "research"
    }

    async fn run(&self, state: &PipelineState, services: &Services) -> StageOutcome {
        let company = &state.company_name;
        let defaults = StateUpdate {
            home_url: Some(NOT_FOUND.to_string()),
            description: Some(NOT_AVAILABLE.to_string()),
            competitors: Some(Vec::new()),
            ..StateUpdate::advance(state)
        };

        let results = match services.search.search(&search_query(company)).await {
            Ok(results) => results,
            Err(e) => {
                warn!(company = %company, error = %e, "search failed");
                return StageOutcome::degraded(defaults, format!("search failed: {e}"));
            }
        };

        let findings: ResearchFindings =
            match extract_json(&services.extractor, &research_prompt(company, &results)).await {
                Ok(findings) => findings,
                Err(e) => {
                    warn!(company = %company, error = %e, "research extraction failed");
                    return StageOutcome::degraded(defaults, format!("extraction failed: {e}"));
                }
            };

        let home_url = non_blank(findings.website_url).unwrap_or_else(|| NOT_FOUND.to_string());
        info!(company = %company, website = %home_url, competitors = findings.competitors.len(), "research complete");

        StageOutcome::Ok(StateUpdate {
            home_url: Some(home_url),
            description: Some(
                non_blank(findings.description).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            competitors: Some(findings.competitors),
            ..StateUpdate::advance(state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::testing::{services, FakeFetcher, FakeSearch};
    use std::sync::Arc;

    async fn run(reply: MockBackend, search: FakeSearch) -> (StageOutcome, Arc<MockBackend>, Arc<FakeSearch>) {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(reply);
        let search = Arc::new(search);
        let services = services(llm.clone(), search.clone(), Arc::new(FakeFetcher::new()), dir.path());
        let outcome = ResearchStage.run(&PipelineState::new("Acme"), &services).await;
        (outcome, llm, search)
    }

    #[tokio::test]
    async fn test_research_parses_fenced_findings() {
        let reply = "```json\n{\"website_url\": \"https://acme.test\", \"description\": \"Makes anvils.\", \"competitors\": [\"Globex\", \"Initech\"]}\n```";
        let (outcome, llm, search) = run(
            MockBackend::fixed(reply),
            FakeSearch::returning("Acme Corp\nhttps://acme.test\nAnvils"),
        )
        .await;

        assert_eq!(search.queries(), vec!["Acme official website competitors"]);
        assert!(llm.prompts()[0].contains("https://acme.test\nAnvils"));

        let StageOutcome::Ok(update) = outcome else {
            panic!("expected Ok, got {outcome:?}");
        };
        assert_eq!(update.home_url.as_deref(), Some("https://acme.test"));
        assert_eq!(update.description.as_deref(), Some("Makes anvils."));
        assert_eq!(update.competitors, Some(vec!["Globex".to_string(), "Initech".to_string()]));
        assert_eq!(update.loop_count, Some(1));
    }

    #[tokio::test]
    async fn test_research_search_failure_uses_defaults() {
        let (outcome, llm, _) = run(MockBackend::fixed("{}"), FakeSearch::failing("rate limited")).await;

        assert_eq!(llm.calls(), 0);
        assert!(outcome.reason().unwrap().contains("rate limited"));
        let update = outcome.update();
        assert_eq!(update.home_url.as_deref(), Some(NOT_FOUND));
        assert_eq!(update.description.as_deref(), Some(NOT_AVAILABLE));
        assert_eq!(update.competitors, Some(vec![]));
        assert_eq!(update.loop_count, Some(1));
    }

    #[tokio::test]
    async fn test_research_malformed_json_uses_defaults() {
        let (outcome, _, _) = run(
            MockBackend::fixed("Sorry, I cannot help with that."),
            FakeSearch::returning("results"),
        )
        .await;

        assert!(matches!(outcome, StageOutcome::Degraded { .. }));
        assert_eq!(outcome.update().home_url.as_deref(), Some(NOT_FOUND));
    }

    #[tokio::test]
    async fn test_research_llm_failure_uses_defaults() {
        let (outcome, _, _) = run(MockBackend::failing("401 unauthorized"), FakeSearch::returning("results")).await;
        assert!(outcome.reason().unwrap().contains("401 unauthorized"));
        assert_eq!(outcome.update().loop_count, Some(1));
    }

    #[tokio::test]
    async fn test_research_null_website_becomes_sentinel() {
        let (outcome, _, _) = run(
            MockBackend::fixed(r#"{"website_url": null, "description": "", "competitors": []}"#),
            FakeSearch::returning("results"),
        )
        .await;

        let update = outcome.update();
        assert_eq!(update.home_url.as_deref(), Some(NOT_FOUND));
        assert_eq!(update.description.as_deref(), Some(NOT_AVAILABLE));
    }

    #[tokio::test]
    async fn test_research_null_competitors_keep_website() {
        let (outcome, _, _) = run(
            MockBackend::fixed(r#"{"website_url": "https://acme.test", "description": "Anvils.", "competitors": null}"#),
            FakeSearch::returning("results"),
        )
        .await;

        let StageOutcome::Ok(update) = outcome else {
            panic!("expected Ok, got {outcome:?}");
        };
        assert_eq!(update.home_url.as_deref(), Some("https://acme.test"));
        assert_eq!(update.description.as_deref(), Some("Anvils."));
        assert_eq!(update.competitors, Some(vec![]));
    }
}
