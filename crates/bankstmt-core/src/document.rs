//! Input documents and their declared formats.

use std::fmt;
use std::path::Path;

use crate::error::ExtractionError;

/// Spreadsheet flavours with a trusted header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Csv,
    Xlsx,
    Xls,
    Ods,
}

/// Declared format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Spreadsheet(SpreadsheetKind),
    Pdf,
}

impl DocumentFormat {
    /// Map a file extension (without the dot, any case).
    pub fn from_extension(ext: &str) -> Result<Self, ExtractionError> {
        match ext.to_lowercase().as_str() {
            "csv" => Ok(Self::Spreadsheet(SpreadsheetKind::Csv)),
            "xlsx" | "xlsm" => Ok(Self::Spreadsheet(SpreadsheetKind::Xlsx)),
            "xls" => Ok(Self::Spreadsheet(SpreadsheetKind::Xls)),
            "ods" => Ok(Self::Spreadsheet(SpreadsheetKind::Ods)),
            "pdf" => Ok(Self::Pdf),
            other => Err(ExtractionError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Map a file path by its extension.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExtractionError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Spreadsheet(kind) => write!(f, "spreadsheet ({:?})", kind),
            DocumentFormat::Pdf => f.write_str("pdf"),
        }
    }
}

/// Raw document bytes plus declared format.
///
/// The bytes stay borrowed for the whole strategy chain, so every fallback
/// strategy re-reads the same input.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub bytes: &'a [u8],
    pub format: DocumentFormat,
}

impl<'a> Document<'a> {
    pub fn new(bytes: &'a [u8], format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
