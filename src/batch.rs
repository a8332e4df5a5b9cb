//! Batch generation over a CSV of company names.
//!
//! Reads a `Company` column, runs the pipeline once per row, saves each
//! report into a reports folder, and writes one summary CSV. A failing
//! company is recorded and skipped; it never stops the batch.

use crate::error::Result;
use crate::pipeline::BattleCardPipeline;
use crate::types::PipelineState;
use crate::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_INPUT: &str = "companies.csv";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_SUMMARY: &str = "final_delivery.csv";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Written by [`ensure_sample_input`] when no input file exists.
pub const SAMPLE_INPUT: &str = "Company\nSlack\nodoo\nsalesforce";

/// Anything that can produce a finished state for a company name.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, company: &str) -> Result<PipelineState>;
}

#[async_trait]
impl CardGenerator for BattleCardPipeline {
    async fn generate(&self, company: &str) -> Result<PipelineState> {
        self.run(company).await
    }
}

#[derive(Debug, Deserialize)]
struct InputRow {
    #[serde(rename = "Company")]
    company: String,
}

/// One line of the summary CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Starter_Price")]
    pub starter_price: String,
    #[serde(rename = "Report_File")]
    pub report_file: String,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub summary: Vec<SummaryRow>,
    pub failed: Vec<String>,
}

/// Read company names from the `Company` column of a CSV file.
pub fn read_companies(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let has_column = reader.headers()?.iter().any(|h| h.trim() == "Company");
    if !has_column {
        return Err(PipelineError::InvalidConfig(format!(
            "{} has no Company column",
            path.display()
        )));
    }

    let mut companies = Vec::new();
    for row in reader.deserialize::<InputRow>() {
        let name = row?.company.trim().to_string();
        if !name.is_empty() {
            companies.push(name);
        }
    }
    Ok(companies)
}

/// Create `path` with a small sample company list if it does not exist.
///
/// Returns `true` when the file was created.
pub fn ensure_sample_input(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, SAMPLE_INPUT)?;
    Ok(true)
}

/// Drives a [`CardGenerator`] over many companies.
pub struct BatchRunner<G> {
    generator: G,
    reports_dir: PathBuf,
    summary_path: PathBuf,
    delay: Duration,
}

impl<G: CardGenerator> BatchRunner<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            summary_path: PathBuf::from(DEFAULT_SUMMARY),
            delay: DEFAULT_DELAY,
        }
    }

    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    pub fn with_summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = path.into();
        self
    }

    /// Pause between companies. Default: 2 seconds.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run every company in `input` (a CSV with a `Company` column).
    pub async fn run_file(&self, input: &Path) -> Result<BatchReport> {
        let companies = read_companies(input)?;
        self.run(&companies).await
    }

    /// Run every company in order, then write the summary CSV if any succeeded.
    pub async fn run(&self, companies: &[String]) -> Result<BatchReport> {
        tokio::fs::create_dir_all(&self.reports_dir).await?;
        info!(companies = companies.len(), "starting batch");

        let mut report = BatchReport::default();
        for (i, company) in companies.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            info!(company = %company, progress = %format!("{}/{}", i + 1, companies.len()), "processing");

            match self.generator.generate(company).await {
                Ok(state) if !state.final_report.trim().is_empty() => {
                    match self.save(company, &state).await {
                        Ok(row) => {
                            info!(company = %company, "finished");
                            report.summary.push(row);
                        }
                        Err(e) => {
                            error!(company = %company, error = %e, "could not save report");
                            report.failed.push(company.clone());
                        }
                    }
                }
                Ok(_) => {
                    warn!(company = %company, "empty result");
                    report.failed.push(company.clone());
                }
                Err(e) => {
                    error!(company = %company, error = %e, "generation failed");
                    report.failed.push(company.clone());
                }
            }
        }

        if !report.summary.is_empty() {
            write_summary(&self.summary_path, &report.summary)?;
            info!(path = %self.summary_path.display(), rows = report.summary.len(), "summary written");
        }
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "some companies failed");
        }
        Ok(report)
    }

    async fn save(&self, company: &str, state: &PipelineState) -> Result<SummaryRow> {
        let path = self.reports_dir.join(format!("{company}_Battle_Card.md"));
        tokio::fs::write(&path, &state.final_report).await?;
        Ok(SummaryRow {
            company: company.to_string(),
            website: state.home_url.clone(),
            description: state.description.clone(),
            starter_price: starter_price(state),
            report_file: path.display().to_string(),
        })
    }
}

/// Starter plan price from the first pricing record, or `"Unknown"`.
pub fn starter_price(state: &PipelineState) -> String {
    state
        .pricing()
        .and_then(|record| record.starter_plan.as_ref())
        .and_then(|plan| plan.price.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
