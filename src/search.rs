//! General web search used by the research stage.

use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Endpoint of DuckDuckGo's JavaScript-free results page.
pub const DUCKDUCKGO_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Returned when a search yields no results.
pub const NO_RESULTS: &str = "No good DuckDuckGo Search Result was found";

/// Free-text web search returning results flattened into one prompt-ready string.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// One parsed search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// [`WebSearch`] over DuckDuckGo's HTML results page. No API key needed.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::fetch::USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: DUCKDUCKGO_HTML_ENDPOINT.to_string(),
            max_results: 10,
        })
    }

    /// Point at a different results page (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        let html = response.text().await?;
        let hits = parse_results(&html, self.max_results)?;
        debug!(hits = hits.len(), "search results parsed");

        if hits.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }
        Ok(format_hits(&hits))
    }
}

/// Parse result blocks out of a DuckDuckGo HTML results page.
pub fn parse_results(html: &str, limit: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let hits = document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&title_sel).next()?;
            let href = link.value().attr("href")?;
            Some(SearchHit {
                title: element_text(&link),
                url: resolve_result_url(href),
                snippet: result
                    .select(&snippet_sel)
                    .next()
                    .map(|s| element_text(&s))
                    .unwrap_or_default(),
            })
        })
        .take(limit)
        .collect();

    Ok(hits)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| PipelineError::Other(format!("invalid selector {css:?}: {e:?}")))
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwrap DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn resolve_result_url(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("{}\n{}\n{}", hit.title, hit.url, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}
