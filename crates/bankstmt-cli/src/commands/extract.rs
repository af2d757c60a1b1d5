//! Extract command - pull transactions out of a single statement file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use bankstmt_core::{
    AttemptStatus, Document, DocumentFormat, ExtractionOutcome, StatementConfig, StatementExtractor, Transaction,
};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input statement (CSV, XLS, XLSX, ODS or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Include the raw OCR text in the output (only present when the
    /// OCR/LLM fallback ran; table strategies never OCR)
    #[arg(long)]
    include_ocr_text: bool,

    /// Merge dateless description-only rows into the previous transaction
    #[arg(long)]
    merge_wrapped: bool,

    /// Exit successfully even when no transactions are found
    #[arg(long)]
    allow_empty: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Per-file output document.
#[derive(Serialize)]
pub struct StatementReport<'a> {
    pub filename: String,
    pub size: usize,
    pub transactions: &'a [Transaction],
    pub strategy: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<&'a str>,
}

impl<'a> StatementReport<'a> {
    pub fn new(path: &Path, size: usize, outcome: &'a ExtractionOutcome) -> Self {
        Self {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size,
            transactions: &outcome.transactions,
            strategy: outcome.strategy.as_deref(),
            ocr_text: outcome.ocr_text.as_deref(),
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.include_ocr_text {
        config.pipeline.include_ocr_text = true;
    }
    if args.merge_wrapped {
        config.extraction.merge_wrapped_descriptions = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let format = DocumentFormat::from_path(&args.input)?;
    let bytes = fs::read(&args.input)?;
    let size = bytes.len();

    info!("Extracting {} ({})", args.input.display(), format);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Extracting {}", args.input.display()));
    pb.enable_steady_tick(Duration::from_millis(120));

    // Blocking collaborators (PDF parsing, OCR, HTTP) stay off the async runtime
    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<ExtractionOutcome> {
        let extractor = build_extractor(&config, format)?;
        Ok(extractor.extract(&Document::new(&bytes, format))?)
    })
    .await??;

    pb.finish_and_clear();

    let report = StatementReport::new(&args.input, size, &outcome);
    let output = format_report(&report, &outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if outcome.is_empty() && !args.allow_empty {
        anyhow::bail!("No transactions found in {}", args.input.display());
    }

    Ok(())
}

/// Spreadsheets need no PDF collaborators, so OCR models and API keys are
/// only touched for PDF input.
pub fn build_extractor(config: &StatementConfig, format: DocumentFormat) -> anyhow::Result<StatementExtractor> {
    let extractor = match format {
        DocumentFormat::Spreadsheet(_) => StatementExtractor::builder(config.clone()).build()?,
        DocumentFormat::Pdf => StatementExtractor::from_config(config)?,
    };
    Ok(extractor)
}

pub fn format_report(
    report: &StatementReport<'_>,
    outcome: &ExtractionOutcome,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report.transactions),
        OutputFormat::Text => Ok(format_text(report, outcome)),
    }
}

pub fn format_csv(transactions: &[Transaction]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["date", "description", "debit", "credit", "balance"])?;

    for tx in transactions {
        wtr.write_record([
            tx.date_string(),
            tx.description.clone(),
            tx.debit.to_string(),
            tx.credit.to_string(),
            tx.balance.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &StatementReport<'_>, outcome: &ExtractionOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {} ({} bytes)\n", report.filename, report.size));
    output.push_str(&format!(
        "Strategy: {}\n",
        report.strategy.unwrap_or("none")
    ));

    for attempt in &outcome.attempts {
        let status = match &attempt.status {
            AttemptStatus::Succeeded => format!("{} transactions", attempt.transactions),
            AttemptStatus::Empty => "nothing found".to_string(),
            AttemptStatus::Failed(e) => format!("failed: {}", e),
        };
        output.push_str(&format!("  {:<14} {:>6}ms  {}\n", attempt.name, attempt.duration_ms, status));
    }
    output.push('\n');

    output.push_str(&format!("Transactions: {}\n", report.transactions.len()));
    for tx in report.transactions {
        output.push_str(&format!(
            "  {:<10}  {:<40}  {:>12}  {:>12}  {:>12}\n",
            tx.date_string(),
            tx.description,
            tx.debit,
            tx.credit,
            tx.balance
        ));
    }

    if let Some(text) = report.ocr_text {
        output.push_str("\nOCR text:\n");
        output.push_str(text);
        output.push('\n');
    }

    output
}
