//! battle-card CLI: generate competitive battle cards for one company or a
//! CSV batch.

use anyhow::{Context, Result};
use battle_card::batch::{self, BatchRunner};
use battle_card::{AppConfig, BattleCardPipeline, SemanticRetriever};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Characters of the final report echoed after an interactive run.
const PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(
    name = "battle-card",
    version,
    about = "Generate competitive battle cards from web search, scraping and an LLM.",
    long_about = None,
)]
struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory for per-company report and data files.
    #[arg(long, env = "BATTLE_CARD_OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one battle card. Prompts for the company when omitted.
    Generate {
        company: Option<String>,
    },

    /// Generate battle cards for every company in a CSV file.
    Batch {
        /// CSV with a `Company` column. Created with sample rows if missing.
        #[arg(short, long, default_value = batch::DEFAULT_INPUT)]
        input: PathBuf,

        /// Folder receiving `{company}_Battle_Card.md` files.
        #[arg(short, long, default_value = batch::DEFAULT_REPORTS_DIR)]
        reports: PathBuf,

        /// Summary CSV path.
        #[arg(short, long, default_value = batch::DEFAULT_SUMMARY)]
        summary: PathBuf,

        /// Seconds to wait between companies.
        #[arg(long, default_value_t = 2)]
        delay_secs: u64,
    },
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "battle_card=info",
        1 => "battle_card=debug",
        _ => "battle_card=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn build_pipeline(config: &AppConfig) -> Result<BattleCardPipeline> {
    let llm = config.llm_client().context("failed to configure the LLM client")?;
    let embedder = config.embedder().context("failed to configure embeddings")?;
    let pipeline = BattleCardPipeline::builder()
        .llm(llm)
        .retrieval(Arc::new(SemanticRetriever::new(embedder)))
        .output_dir(&config.output_dir)
        .build()?;
    Ok(pipeline)
}

fn prompt_company() -> Result<String> {
    print!("Enter company name: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn preview(report: &str) -> String {
    let mut text: String = report.chars().take(PREVIEW_CHARS).collect();
    text.push_str("...");
    text
}

async fn cmd_generate(config: &AppConfig, company: Option<String>) -> Result<()> {
    let company = match company {
        Some(name) => name,
        None => prompt_company()?,
    };
    anyhow::ensure!(!company.trim().is_empty(), "company name must not be empty");

    let pipeline = build_pipeline(config)?;
    let state = pipeline
        .run_with_progress(&company, |p| {
            tracing::debug!(stage = %p.stage_name, step = p.stage_index + 1, of = p.total_stages, "stage starting");
        })
        .await
        .with_context(|| format!("battle card generation failed for {company}"))?;

    println!("\nFinal Report Preview:");
    println!("{}", "-".repeat(60));
    println!("{}", preview(&state.final_report));
    Ok(())
}

async fn cmd_batch(
    config: &AppConfig,
    input: PathBuf,
    reports: PathBuf,
    summary: PathBuf,
    delay_secs: u64,
) -> Result<()> {
    if batch::ensure_sample_input(&input)? {
        tracing::info!(path = %input.display(), "created sample input");
    }

    let runner = BatchRunner::new(build_pipeline(config)?)
        .with_reports_dir(&reports)
        .with_summary_path(&summary)
        .with_delay(Duration::from_secs(delay_secs));
    let report = runner
        .run_file(&input)
        .await
        .with_context(|| format!("batch over {} failed", input.display()))?;

    if !report.summary.is_empty() {
        println!(
            "Batch complete: {} card(s). See '{}' and '{}'.",
            report.summary.len(),
            summary.display(),
            reports.display()
        );
    }
    if !report.failed.is_empty() {
        println!("Failed companies: {}", report.failed.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config = AppConfig::from_env()?;
    if let Some(ref dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }

    match cli.command {
        Command::Generate { company } => cmd_generate(&config, company).await,
        Command::Batch {
            input,
            reports,
            summary,
            delay_secs,
        } => cmd_batch(&config, input, reports, summary, delay_secs).await,
    }
}
