//! Core library for bank statement transaction extraction.
//!
//! This crate provides:
//! - Field normalization for dates and amounts as printed on statements
//! - Fuzzy column matching and header localization for loosely parsed tables
//! - Spreadsheet reading (CSV, XLSX, XLS, ODS)
//! - A PDF strategy pipeline: text-layer table detectors, then OCR + LLM
//!
//! The usual entry point is [`StatementExtractor`].

pub mod columns;
pub mod convert;
pub mod document;
pub mod error;
pub mod extract;
pub mod header;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod reconcile;
pub mod spreadsheet;
pub mod table;

pub use columns::ColumnPatternSet;
pub use convert::{TableConverter, TableInterpreter, TableOutcome};
pub use document::{Document, DocumentFormat, SpreadsheetKind};
pub use error::{ExtractionError, Result, StatementError};
pub use extract::{StatementExtractor, StatementExtractorBuilder};
pub use header::{HeaderLocator, HeaderSearch};
pub use llm::TransactionLlm;
pub use models::{CanonicalField, StatementConfig, Transaction};
pub use normalize::{normalize_amount, normalize_date, DateOrder};
pub use ocr::OcrTextSource;
pub use pdf::TableDetector;
pub use pipeline::{AttemptStatus, ExtractionOutcome, ExtractionPipeline, ExtractionStrategy, StrategyAttempt};
pub use table::{HeaderMap, RawTable};

#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;

#[cfg(feature = "openai")]
pub use llm::OpenAiExtractor;
