//! Persisting a finished battle card: the markdown report plus a JSON
//! sidecar of the facts it was written from.

use crate::error::Result;
use crate::types::{Headline, PipelineState, PricingRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Facts a report was generated from, as written to the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub company_name: String,
    pub website: String,
    pub description: String,
    pub competitors: Vec<String>,
    pub pricing_info: Vec<PricingRecord>,
    pub news_headlines: Vec<Headline>,
}

impl From<&PipelineState> for RawData {
    fn from(state: &PipelineState) -> Self {
        Self {
            company_name: state.company_name.clone(),
            website: state.home_url.clone(),
            description: state.description.clone(),
            competitors: state.competitors.clone(),
            pricing_info: state.pricing_info.clone(),
            news_headlines: state.news_headlines.clone(),
        }
    }
}

/// Paths written by [`persist`].
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub report: PathBuf,
    pub data: PathBuf,
}

/// File stem for a company: spaces become underscores, then lowercased.
///
/// ```
/// use battle_card::report::sanitize_company_name;
///
/// assert_eq!(sanitize_company_name("Acme Rocket Co"), "acme_rocket_co");
/// ```
pub fn sanitize_company_name(company: &str) -> String {
    company.replace(' ', "_").to_lowercase()
}

pub fn report_path(dir: &Path, company: &str) -> PathBuf {
    dir.join(format!("{}_battle_card.md", sanitize_company_name(company)))
}

pub fn data_path(dir: &Path, company: &str) -> PathBuf {
    dir.join(format!("{}_data.json", sanitize_company_name(company)))
}

/// Write `report` and the state's facts under `dir`, creating it if needed.
pub async fn persist(dir: &Path, state: &PipelineState, report: &str) -> Result<Artifacts> {
    tokio::fs::create_dir_all(dir).await?;

    let report_file = report_path(dir, &state.company_name);
    tokio::fs::write(&report_file, report).await?;

    let data_file = data_path(dir, &state.company_name);
    let json = serde_json::to_string_pretty(&RawData::from(state))?;
    tokio::fs::write(&data_file, json).await?;

    debug!(report = %report_file.display(), data = %data_file.display(), "artifacts written");
    Ok(Artifacts {
        report: report_file,
        data: data_file,
    })
}

/// Read a sidecar written by [`persist`].
pub async fn load_raw_data(path: &Path) -> Result<RawData> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}
