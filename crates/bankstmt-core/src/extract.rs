//! Document-level entry point: size checks, format dispatch and assembly of
//! the default collaborators.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::columns::ColumnPatternSet;
use crate::convert::TableInterpreter;
use crate::document::{Document, DocumentFormat};
use crate::error::{ExtractionError, Result};
use crate::llm::TransactionLlm;
use crate::models::StatementConfig;
use crate::ocr::OcrTextSource;
use crate::pdf::{AlignedColumnDetector, TableDetector, WhitespaceGridDetector};
use crate::pipeline::{ExtractionOutcome, ExtractionPipeline, OcrLlmStrategy, StructuredTableStrategy};
use crate::reconcile::OcrLlmReconciler;
use crate::spreadsheet::{SpreadsheetReader, WorkbookReader};

/// Strategy name reported for spreadsheet input.
pub const SPREADSHEET_STRATEGY: &str = "spreadsheet";

/// Extracts transactions from spreadsheets and PDF statements.
pub struct StatementExtractor {
    reader: Box<dyn SpreadsheetReader>,
    interpreter: TableInterpreter,
    pipeline: ExtractionPipeline,
    max_file_size: usize,
}

impl StatementExtractor {
    /// Start a builder with no PDF collaborators.
    pub fn builder(config: StatementConfig) -> StatementExtractorBuilder {
        StatementExtractorBuilder::new(config)
    }

    /// Build with the default detectors, OCR engine and LLM client.
    ///
    /// OCR and LLM collaborators that cannot be created (missing models,
    /// missing API key, feature not compiled in) are left out with a warning.
    pub fn from_config(config: &StatementConfig) -> Result<Self> {
        let mut builder = Self::builder(config.clone())
            .with_layout_detector(Box::new(AlignedColumnDetector::new(&config.pdf)))
            .with_grid_detector(Box::new(WhitespaceGridDetector::new(&config.pdf)));

        if config.pipeline.enable_ocr_llm {
            if let Some(ocr) = default_ocr(config) {
                builder = builder.with_ocr(ocr);
            }
            if let Some(llm) = default_llm(config) {
                builder = builder.with_llm(llm);
            }
        }

        builder.build()
    }

    /// Names of the PDF strategies in run order.
    pub fn pdf_strategies(&self) -> Vec<&'static str> {
        self.pipeline.strategy_names()
    }

    /// Extract transactions from a document.
    pub fn extract(&self, document: &Document<'_>) -> Result<ExtractionOutcome> {
        self.check_size(document.len())?;

        match document.format {
            DocumentFormat::Spreadsheet(kind) => {
                let table = self.reader.read(document.bytes, kind)?;
                debug!("Spreadsheet has {} rows", table.len());
                let transactions = self.interpreter.interpret_trusted(&table)?;
                info!("Extracted {} transactions from spreadsheet", transactions.len());
                Ok(ExtractionOutcome {
                    transactions,
                    strategy: Some(SPREADSHEET_STRATEGY.to_string()),
                    ..ExtractionOutcome::default()
                })
            }
            DocumentFormat::Pdf => Ok(self.pipeline.run(document.bytes)),
        }
    }

    /// Read a file and extract it, choosing the format by extension.
    pub fn extract_file(&self, path: &Path) -> Result<ExtractionOutcome> {
        let format = DocumentFormat::from_path(path)?;
        self.check_size(std::fs::metadata(path)?.len() as usize)?;

        let bytes = std::fs::read(path)?;
        self.extract(&Document::new(&bytes, format))
    }

    /// A limit of 0 accepts any size.
    fn check_size(&self, size: usize) -> Result<()> {
        if self.max_file_size != 0 && size > self.max_file_size {
            return Err(ExtractionError::TooLarge {
                size,
                limit: self.max_file_size,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(feature = "native")]
fn default_ocr(config: &StatementConfig) -> Option<Arc<dyn OcrTextSource>> {
    match crate::ocr::PureOcrEngine::from_config(config.ocr.clone()) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            warn!("OCR disabled: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "native"))]
fn default_ocr(_config: &StatementConfig) -> Option<Arc<dyn OcrTextSource>> {
    let e = crate::error::OcrError::Unavailable("built without the native feature".to_string());
    warn!("OCR disabled: {}", e);
    None
}

#[cfg(feature = "openai")]
fn default_llm(config: &StatementConfig) -> Option<Arc<dyn TransactionLlm>> {
    match crate::llm::OpenAiExtractor::from_config(config.llm.clone()) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("LLM extraction disabled: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "openai"))]
fn default_llm(_config: &StatementConfig) -> Option<Arc<dyn TransactionLlm>> {
    let e = crate::error::LlmError::Unavailable("built without the openai feature".to_string());
    warn!("LLM extraction disabled: {}", e);
    None
}

/// Builder for [`StatementExtractor`] with injectable collaborators.
pub struct StatementExtractorBuilder {
    config: StatementConfig,
    reader: Box<dyn SpreadsheetReader>,
    layout: Option<Box<dyn TableDetector>>,
    grid: Option<Box<dyn TableDetector>>,
    ocr: Option<Arc<dyn OcrTextSource>>,
    llm: Option<Arc<dyn TransactionLlm>>,
}

impl StatementExtractorBuilder {
    pub fn new(config: StatementConfig) -> Self {
        Self {
            config,
            reader: Box::new(WorkbookReader::new()),
            layout: None,
            grid: None,
            ocr: None,
            llm: None,
        }
    }

    pub fn with_spreadsheet_reader(mut self, reader: Box<dyn SpreadsheetReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Strategy A.
    pub fn with_layout_detector(mut self, detector: Box<dyn TableDetector>) -> Self {
        self.layout = Some(detector);
        self
    }

    /// Strategy B.
    pub fn with_grid_detector(mut self, detector: Box<dyn TableDetector>) -> Self {
        self.grid = Some(detector);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrTextSource>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn TransactionLlm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn build(self) -> Result<StatementExtractor> {
        let extraction = &self.config.extraction;
        let patterns = ColumnPatternSet::default().with_extra(&extraction.extra_column_patterns)?;
        let interpreter = TableInterpreter::from_config(patterns, extraction);
        let toggles = &self.config.pipeline;

        let mut pipeline = ExtractionPipeline::new().with_ocr_text(toggles.include_ocr_text);

        if toggles.enable_layout_tables {
            if let Some(detector) = self.layout {
                pipeline = pipeline.with_strategy(Box::new(StructuredTableStrategy::new(detector, interpreter.clone())));
            }
        }
        if toggles.enable_grid_tables {
            if let Some(detector) = self.grid {
                pipeline = pipeline.with_strategy(Box::new(StructuredTableStrategy::new(detector, interpreter.clone())));
            }
        }
        if toggles.enable_ocr_llm {
            match (self.ocr, self.llm) {
                (Some(ocr), Some(llm)) => {
                    let reconciler = OcrLlmReconciler::new(llm).with_date_order(extraction.date_order);
                    pipeline = pipeline.with_strategy(Box::new(OcrLlmStrategy::new(ocr, reconciler)));
                }
                (ocr, llm) => debug!(
                    "OCR/LLM strategy not configured (ocr: {}, llm: {})",
                    ocr.is_some(),
                    llm.is_some()
                ),
            }
        }

        debug!("PDF strategies: {:?}", pipeline.strategy_names());

        Ok(StatementExtractor {
            reader: self.reader,
            interpreter,
            pipeline,
            max_file_size: self.config.input.max_file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SpreadsheetKind;
    use crate::error::StatementError;
    use crate::models::CanonicalField;

    fn csv(data: &[u8]) -> Document<'_> {
        Document::new(data, DocumentFormat::Spreadsheet(SpreadsheetKind::Csv))
    }

    #[test]
    fn test_size_limit() {
        let mut config = StatementConfig::default();
        config.input.max_file_size = 8;
        let extractor = StatementExtractor::builder(config).build().unwrap();

        let err = extractor.extract(&csv(b"Date,Description,Debit\n")).unwrap_err();
        assert!(matches!(
            err,
            StatementError::Extraction(ExtractionError::TooLarge { limit: 8, .. })
        ));
    }

    #[test]
    fn test_zero_size_limit_is_unlimited() {
        let mut config = StatementConfig::default();
        config.input.max_file_size = 0;
        let extractor = StatementExtractor::builder(config).build().unwrap();

        let outcome = extractor
            .extract(&csv(b"Date,Description,Credit\n02/01/2024,Salary,1000.00\n"))
            .unwrap();
        assert_eq!(outcome.transactions.len(), 1);
    }

    #[test]
    fn test_text_pdf_uses_layout_table() {
        let pdf = crate::pdf::fixtures::statement_pdf(&[
            &[(50, "Date"), (130, "Description"), (330, "Debit"), (400, "Credit"), (480, "Balance")],
            &[(50, "02/01/2024"), (130, "Salary"), (400, "1,000.00"), (480, "1,000.00")],
            &[(50, "03/01/2024"), (130, "Coffee Shop"), (330, "4.50"), (480, "995.50")],
        ]);
        let mut config = StatementConfig::default();
        config.pipeline.enable_ocr_llm = false;
        let extractor = StatementExtractor::from_config(&config).unwrap();

        let outcome = extractor.extract(&Document::new(&pdf, DocumentFormat::Pdf)).unwrap();
        assert_eq!(outcome.strategy.as_deref(), Some("layout_table"));
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.transactions.len(), 2);
        assert_eq!(outcome.transactions[1].description, "Coffee Shop");
        assert_eq!(outcome.transactions[1].date_string(), "2024-01-03");
    }

    #[test]
    fn test_spreadsheet_missing_columns() {
        let extractor = StatementExtractor::builder(StatementConfig::default()).build().unwrap();
        let err = extractor
            .extract(&csv(b"Date,Description,Reference\n2024-01-02,Salary,X\n"))
            .unwrap_err();
        match err {
            StatementError::Extraction(ExtractionError::MissingColumns(fields)) => {
                assert_eq!(fields, vec![CanonicalField::Debit, CanonicalField::Credit]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_spreadsheet_strategy_name() {
        let extractor = StatementExtractor::builder(StatementConfig::default()).build().unwrap();
        let outcome = extractor
            .extract(&csv(b"Date,Description,Credit\n02/01/2024,Salary,1000.00\n"))
            .unwrap();
        assert_eq!(outcome.strategy.as_deref(), Some(SPREADSHEET_STRATEGY));
        assert_eq!(outcome.transactions.len(), 1);
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_disabled_strategies_are_skipped() {
        let mut config = StatementConfig::default();
        config.pipeline.enable_grid_tables = false;
        config.pipeline.enable_ocr_llm = false;
        let extractor = StatementExtractor::from_config(&config).unwrap();
        assert_eq!(extractor.pdf_strategies(), vec!["layout_table"]);
    }

    #[test]
    fn test_unsupported_file_extension() {
        let extractor = StatementExtractor::builder(StatementConfig::default()).build().unwrap();
        let err = extractor.extract_file(Path::new("statement.docx")).unwrap_err();
        assert!(matches!(
            err,
            StatementError::Extraction(ExtractionError::UnsupportedFormat(_))
        ));
    }
}
