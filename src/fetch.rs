//! Text acquisition: fetch a page and reduce it to a bounded window of
//! visible text.
//!
//! Failures are reported in-band. [`TextFetcher::fetch_text`] returns a string
//! starting with [`ERROR_PREFIX`] instead of an error, so callers can treat a
//! dead candidate page like any other unusable text.

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Node};
use std::time::Duration;
use tracing::{debug, instrument};

/// Prefix of every in-band failure marker.
pub const ERROR_PREFIX: &str = "Error";

/// Per-request connect/read timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters of cleaned text skipped before the window starts. Navigation
/// and header boilerplate usually lives here.
pub const WINDOW_START: usize = 2000;

/// Characters of cleaned text at which the window ends.
pub const WINDOW_END: usize = 7000;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Whether `text` is an in-band failure marker.
pub fn is_error_marker(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX)
}

/// Page fetching as seen by the pipeline stages.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    /// Cleaned, windowed text of `url`, or an error marker.
    async fn fetch_text(&self, url: &str) -> String;

    /// HTTP status of a plain GET to `url`.
    async fn probe_status(&self, url: &str) -> Result<u16>;
}

/// [`TextFetcher`] over reqwest with a browser user agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured client. The caller owns its timeout and user agent.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch_text(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return format!("Error: Could not scrape {}. Reason: {}", url, e),
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(status = status.as_u16(), "non-200 response");
            return format!("Error: Status code {}", status.as_u16());
        }

        match response.text().await {
            Ok(html) => {
                let text = window(&visible_text(&html));
                debug!(chars = text.chars().count(), "page text extracted");
                text
            }
            Err(e) => format!("Error: Could not scrape {}. Reason: {}", url, e),
        }
    }

    async fn probe_status(&self, url: &str) -> Result<u16> {
        let response = self.client.get(url).send().await?;
        Ok(response.status().as_u16())
    }
}

/// Visible text of an HTML document, one trimmed non-empty line per line.
///
/// Text inside `<script>` and `<style>` is dropped.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style"))
        });
        if hidden {
            continue;
        }
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
    }

    lines.join("\n")
}

/// Characters `WINDOW_START..WINDOW_END` of `text`.
pub fn window(text: &str) -> String {
    text.chars()
        .skip(WINDOW_START)
        .take(WINDOW_END - WINDOW_START)
        .collect()
}
