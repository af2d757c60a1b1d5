//! Error types for the bankstmt-core library.

use thiserror::Error;

use crate::models::transaction::CanonicalField;

/// Main error type for the bankstmt library.
#[derive(Error, Debug)]
pub enum StatementError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// LLM collaborator error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No OCR engine is available in this build or configuration.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The document could not be turned into page images.
    #[error("no page images: {0}")]
    NoImages(String),
}

/// Errors raised by the LLM transaction extractor.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The API key environment variable is not set.
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// Transport-level failure (connection, timeout, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response did not contain usable JSON.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No LLM backend is compiled in or configured.
    #[error("LLM extractor unavailable: {0}")]
    Unavailable(String),
}

/// Errors related to transaction extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The declared document format has no extraction path.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// The document exceeds the configured size limit.
    #[error("document is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// The table lacks required canonical columns even after fuzzy matching.
    #[error("missing required columns: {}", format_fields(.0))]
    MissingColumns(Vec<CanonicalField>),

    /// A spreadsheet could not be read.
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    /// The spreadsheet contains no rows at all.
    #[error("spreadsheet is empty")]
    EmptyTable,
}

/// Failure of one extraction strategy. The pipeline records it and moves on.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

fn format_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for the bankstmt library.
pub type Result<T> = std::result::Result<T, StatementError>;
