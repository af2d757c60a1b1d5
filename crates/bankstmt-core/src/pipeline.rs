//! Ordered extraction strategies for PDF statements.
//!
//! Strategies run one after another on the same bytes. The first strategy
//! that yields at least one transaction wins; empty results and failures
//! fall through to the next strategy. Running out of strategies is an empty
//! outcome, not an error.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::convert::TableInterpreter;
use crate::error::StrategyError;
use crate::models::Transaction;
use crate::ocr::OcrTextSource;
use crate::pdf::TableDetector;
use crate::reconcile::OcrLlmReconciler;

/// What a strategy produced.
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    pub transactions: Vec<Transaction>,
    /// OCR text the strategy worked from, if any.
    pub ocr_text: Option<String>,
}

impl StrategyOutput {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            ocr_text: None,
        }
    }
}

/// One way of getting transactions out of a PDF.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, pdf: &[u8]) -> Result<StrategyOutput, StrategyError>;
}

/// Structural table detection followed by header localization and conversion.
pub struct StructuredTableStrategy {
    detector: Box<dyn TableDetector>,
    interpreter: TableInterpreter,
}

impl StructuredTableStrategy {
    pub fn new(detector: Box<dyn TableDetector>, interpreter: TableInterpreter) -> Self {
        Self { detector, interpreter }
    }
}

impl ExtractionStrategy for StructuredTableStrategy {
    fn name(&self) -> &'static str {
        self.detector.name()
    }

    fn extract(&self, pdf: &[u8]) -> Result<StrategyOutput, StrategyError> {
        let tables = self.detector.detect(pdf)?;
        debug!("{}: {} candidate tables", self.name(), tables.len());
        Ok(StrategyOutput::new(self.interpreter.interpret_all(&tables)))
    }
}

/// OCR the document, then let the LLM read transactions out of the text.
pub struct OcrLlmStrategy {
    ocr: Arc<dyn OcrTextSource>,
    reconciler: OcrLlmReconciler,
}

impl OcrLlmStrategy {
    pub fn new(ocr: Arc<dyn OcrTextSource>, reconciler: OcrLlmReconciler) -> Self {
        Self { ocr, reconciler }
    }
}

impl ExtractionStrategy for OcrLlmStrategy {
    fn name(&self) -> &'static str {
        "ocr_llm"
    }

    fn extract(&self, pdf: &[u8]) -> Result<StrategyOutput, StrategyError> {
        let text = self.ocr.extract_text(pdf)?;
        let transactions = self.reconciler.reconcile(&text)?;
        Ok(StrategyOutput {
            transactions,
            ocr_text: Some(text),
        })
    }
}

/// How a strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum AttemptStatus {
    Succeeded,
    Empty,
    Failed(String),
}

/// Record of one strategy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub name: String,
    #[serde(flatten)]
    pub status: AttemptStatus,
    pub transactions: usize,
    pub duration_ms: u64,
}

/// Result of extracting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub transactions: Vec<Transaction>,
    /// Name of the strategy that produced the transactions.
    pub strategy: Option<String>,
    pub attempts: Vec<StrategyAttempt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
}

impl ExtractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Sequential strategy chain.
#[derive(Default)]
pub struct ExtractionPipeline {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    include_ocr_text: bool,
}

impl ExtractionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_ocr_text(mut self, include: bool) -> Self {
        self.include_ocr_text = include;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, pdf: &[u8]) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::default();

        for strategy in &self.strategies {
            let start = Instant::now();
            let result = strategy.extract(pdf);
            let duration_ms = start.elapsed().as_millis() as u64;

            let (status, count) = match result {
                Ok(output) => {
                    if self.include_ocr_text && output.ocr_text.is_some() {
                        outcome.ocr_text = output.ocr_text;
                    }
                    let count = output.transactions.len();
                    if count > 0 {
                        outcome.transactions = output.transactions;
                        outcome.strategy = Some(strategy.name().to_string());
                        (AttemptStatus::Succeeded, count)
                    } else {
                        debug!("{} found no transactions", strategy.name());
                        (AttemptStatus::Empty, 0)
                    }
                }
                Err(e) => {
                    warn!("{} failed: {}", strategy.name(), e);
                    (AttemptStatus::Failed(e.to_string()), 0)
                }
            };

            outcome.attempts.push(StrategyAttempt {
                name: strategy.name().to_string(),
                status,
                transactions: count,
                duration_ms,
            });

            if outcome.strategy.is_some() {
                info!("{} extracted {} transactions", strategy.name(), count);
                return outcome;
            }
        }

        info!("No strategy produced transactions ({} tried)", outcome.attempts.len());
        outcome
    }
}
