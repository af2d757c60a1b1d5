//! Spreadsheet readers (CSV via `csv`, Excel/ODS via `calamine`).

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use tracing::debug;

use crate::document::SpreadsheetKind;
use crate::error::ExtractionError;
use crate::table::RawTable;

/// Reads a spreadsheet into one table whose row 0 is the header.
pub trait SpreadsheetReader: Send + Sync {
    fn read(&self, data: &[u8], kind: SpreadsheetKind) -> Result<RawTable, ExtractionError>;
}

/// Reader for CSV files and the first worksheet of XLSX/XLS/ODS workbooks.
#[derive(Debug, Clone, Default)]
pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        Self
    }

    fn read_csv(&self, data: &[u8]) -> Result<RawTable, ExtractionError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;
            rows.push(record.iter().map(|cell| Some(cell.to_string())).collect());
        }

        debug!("Read {} CSV rows", rows.len());
        Ok(RawTable::new(rows))
    }

    fn read_workbook(&self, data: &[u8]) -> Result<RawTable, ExtractionError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
            .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ExtractionError::EmptyTable)?
            .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

        let rows: Vec<Vec<Option<String>>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        debug!("Read {} worksheet rows", rows.len());
        Ok(RawTable::new(rows))
    }
}

impl SpreadsheetReader for WorkbookReader {
    fn read(&self, data: &[u8], kind: SpreadsheetKind) -> Result<RawTable, ExtractionError> {
        match kind {
            SpreadsheetKind::Csv => self.read_csv(data),
            SpreadsheetKind::Xlsx | SpreadsheetKind::Xls | SpreadsheetKind::Ods => self.read_workbook(data),
        }
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => Some(String::new()),
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) => None,
    }
}
