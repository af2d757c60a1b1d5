//! Batch processing command for multiple statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use bankstmt_core::{DocumentFormat, ExtractionOutcome, StatementExtractor};

use super::extract::{format_report, OutputFormat, StatementReport};
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    index: usize,
    path: PathBuf,
    size: usize,
    outcome: Option<ExtractionOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl FileResult {
    fn status(&self) -> &'static str {
        match (&self.outcome, &self.error) {
            (_, Some(_)) => "failed",
            (Some(outcome), None) if outcome.is_empty() => "empty",
            (Some(_), None) => "success",
            (None, None) => "skipped",
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| DocumentFormat::from_path(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let spreadsheets = Arc::new(StatementExtractor::builder(config.clone()).build()?);
    let needs_pdf = files
        .iter()
        .any(|p| matches!(DocumentFormat::from_path(p), Ok(DocumentFormat::Pdf)));
    let pdfs = if needs_pdf {
        let config = config.clone();
        let extractor = tokio::task::spawn_blocking(move || StatementExtractor::from_config(&config)).await??;
        Some(Arc::new(extractor))
    } else {
        None
    };

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let cancelled = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let extractor = match DocumentFormat::from_path(&path) {
            Ok(DocumentFormat::Pdf) => pdfs.clone().unwrap_or_else(|| spreadsheets.clone()),
            _ => spreadsheets.clone(),
        };
        let cancelled = cancelled.clone();
        let continue_on_error = args.continue_on_error;
        let pb = overall_pb.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();

            let mut result = FileResult {
                index,
                path,
                size: 0,
                outcome: None,
                error: None,
                processing_time_ms: 0,
            };

            if !cancelled.load(Ordering::SeqCst) {
                match process_single_file(&extractor, &result.path) {
                    Ok((size, outcome)) => {
                        result.size = size;
                        result.outcome = Some(outcome);
                    }
                    Err(e) => {
                        if continue_on_error {
                            warn!("Failed to process {}: {}", result.path.display(), e);
                        } else {
                            error!("Failed to process {}: {}", result.path.display(), e);
                            cancelled.store(true, Ordering::SeqCst);
                        }
                        result.error = Some(e.to_string());
                    }
                }
            }

            result.processing_time_ms = file_start.elapsed().as_millis() as u64;
            pb.inc(1);
            result
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|r| r.index);

    overall_pb.finish_with_message("Complete");

    if !args.continue_on_error {
        if let Some(failed) = results.iter().find(|r| r.error.is_some()) {
            anyhow::bail!(
                "Processing failed for {}: {}",
                failed.path.display(),
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Some(outcome) = &result.outcome {
                write_output(output_dir, result, outcome, args.format)?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status: &str| results.iter().filter(|r| r.status() == status).count();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} with transactions, {} empty, {} failed",
        style(count("success")).green(),
        style(count("empty")).yellow(),
        style(count("failed")).red()
    );

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(extractor: &StatementExtractor, path: &Path) -> anyhow::Result<(usize, ExtractionOutcome)> {
    let size = fs::metadata(path)?.len() as usize;
    let outcome = extractor.extract_file(path)?;
    debug!(
        "{}: {} transactions via {:?}",
        path.display(),
        outcome.transactions.len(),
        outcome.strategy
    );
    Ok((size, outcome))
}

fn write_output(
    output_dir: &Path,
    result: &FileResult,
    outcome: &ExtractionOutcome,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = result
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    let report = StatementReport::new(&result.path, result.size, outcome);
    fs::write(&output_path, format_report(&report, outcome, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "strategy",
        "transactions",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let (strategy, transactions) = match &result.outcome {
            Some(outcome) => (
                outcome.strategy.clone().unwrap_or_default(),
                outcome.transactions.len().to_string(),
            ),
            None => (String::new(), String::new()),
        };

        wtr.write_record([
            filename,
            result.status(),
            &strategy,
            &transactions,
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
