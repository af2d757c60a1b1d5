//! Table detection over the PDF text layer.
//!
//! Two detectors with different failure modes:
//!
//! - [`AlignedColumnDetector`] finds column gutters shared by the rows of a
//!   page and slices every line on them. Cells a row does not fill are
//!   absent (`None`), so column positions survive blank debit/credit cells.
//! - [`WhitespaceGridDetector`] splits lines on runs of whitespace and treats
//!   each run of consecutive multi-cell lines as a table. Cells are packed to
//!   the left, which is cheaper and works when every column is filled.
//!
//! Both read the layout text of [`super::layout`], where cell positions on
//! the page become character columns. Neither detector trusts the first row
//! as a header; the output goes through header localization.

use tracing::{debug, trace};

use super::{PdfExtractor, PdfProcessor};
use crate::error::PdfError;
use crate::models::config::PdfConfig;
use crate::normalize::patterns::COLUMN_GAP;
use crate::table::RawTable;

/// Structural table detector over a PDF document.
pub trait TableDetector: Send + Sync {
    /// Short identifier used in logs and strategy attempts.
    fn name(&self) -> &'static str;

    /// Detect zero or more tables in the document.
    fn detect(&self, pdf: &[u8]) -> Result<Vec<RawTable>, PdfError>;
}

/// A run of text on one line, positioned by character column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Split a line into spans separated by at least `min_gap` whitespace
/// characters (or any tab).
pub fn split_spans(line: &str, min_gap: usize) -> Vec<TextSpan> {
    let chars: Vec<char> = line.chars().collect();
    let min_gap = min_gap.max(1);
    let mut spans = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i;
        let mut j = i;
        while j < chars.len() {
            if chars[j].is_whitespace() {
                let gap_start = j;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let tab = chars[gap_start..j].contains(&'\t');
                if tab || j - gap_start >= min_gap {
                    break;
                }
            } else {
                j += 1;
                end = j;
            }
        }

        spans.push(TextSpan {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });
        i = j;
    }

    spans
}

fn load_pages(pdf: &[u8], max_pages: usize) -> Result<Vec<String>, PdfError> {
    let extractor = PdfExtractor::from_bytes(pdf)?;
    let pages = extractor.extract_page_layouts(max_pages)?;
    debug!("Scanning {} of {} pages for tables", pages.len(), extractor.page_count());
    Ok(pages)
}

/// Detector A: column gutters shared by multi-cell lines.
#[derive(Debug, Clone)]
pub struct AlignedColumnDetector {
    min_gap: usize,
    min_cells: usize,
    max_pages: usize,
}

impl AlignedColumnDetector {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            min_gap: config.min_column_gap,
            min_cells: config.min_layout_cells,
            max_pages: config.max_pages,
        }
    }

    /// Detect tables in already-extracted page texts, at most one per page.
    pub fn detect_pages<S: AsRef<str>>(&self, pages: &[S]) -> Vec<RawTable> {
        pages
            .iter()
            .enumerate()
            .filter_map(|(idx, page)| {
                let table = self.detect_page(page.as_ref());
                if let Some(t) = &table {
                    trace!("Page {}: aligned table with {} rows", idx + 1, t.len());
                }
                table
            })
            .collect()
    }

    fn detect_page(&self, text: &str) -> Option<RawTable> {
        let lines: Vec<Vec<TextSpan>> = text.lines().map(|l| split_spans(l, self.min_gap)).collect();
        let candidates: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, spans)| spans.len() >= self.min_cells)
            .map(|(i, _)| i)
            .collect();

        let (&first, &last) = (candidates.first()?, candidates.last()?);
        if candidates.len() < 2 {
            return None;
        }

        let columns = gutter_columns(candidates.iter().map(|&i| lines[i].as_slice()));
        if columns.len() < self.min_cells.max(2) {
            return None;
        }

        let rows = lines[first..=last]
            .iter()
            .filter(|spans| !spans.is_empty())
            .map(|spans| {
                let mut cells: Vec<Option<String>> = vec![None; columns.len()];
                for span in spans {
                    match &mut cells[nearest_column(&columns, span.start)] {
                        Some(text) => {
                            text.push(' ');
                            text.push_str(&span.text);
                        }
                        slot @ None => *slot = Some(span.text.clone()),
                    }
                }
                cells
            })
            .collect();

        Some(RawTable::new(rows))
    }
}

impl TableDetector for AlignedColumnDetector {
    fn name(&self) -> &'static str {
        "layout_table"
    }

    fn detect(&self, pdf: &[u8]) -> Result<Vec<RawTable>, PdfError> {
        let pages = load_pages(pdf, self.max_pages)?;
        Ok(self.detect_pages(&pages))
    }
}

/// Column intervals `[start, end)`: maximal runs of character positions
/// covered by some span.
fn gutter_columns<'a>(lines: impl Iterator<Item = &'a [TextSpan]>) -> Vec<(usize, usize)> {
    let mut occupied: Vec<bool> = Vec::new();
    for spans in lines {
        for span in spans {
            if occupied.len() < span.end {
                occupied.resize(span.end, false);
            }
            occupied[span.start..span.end].iter_mut().for_each(|p| *p = true);
        }
    }

    let mut columns = Vec::new();
    let mut start = None;
    for (pos, &used) in occupied.iter().enumerate() {
        match (used, start) {
            (true, None) => start = Some(pos),
            (false, Some(s)) => {
                columns.push((s, pos));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        columns.push((s, occupied.len()));
    }
    columns
}

fn nearest_column(columns: &[(usize, usize)], pos: usize) -> usize {
    columns
        .iter()
        .enumerate()
        .min_by_key(|(_, (start, end))| {
            if pos < *start {
                start - pos
            } else if pos >= *end {
                pos + 1 - end
            } else {
                0
            }
        })
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Detector B: runs of multi-cell lines split on whitespace runs.
#[derive(Debug, Clone)]
pub struct WhitespaceGridDetector {
    max_pages: usize,
}

impl WhitespaceGridDetector {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            max_pages: config.max_pages,
        }
    }

    pub fn detect_pages<S: AsRef<str>>(&self, pages: &[S]) -> Vec<RawTable> {
        pages.iter().flat_map(|page| split_blocks(page.as_ref())).collect()
    }
}

impl TableDetector for WhitespaceGridDetector {
    fn name(&self) -> &'static str {
        "grid_table"
    }

    fn detect(&self, pdf: &[u8]) -> Result<Vec<RawTable>, PdfError> {
        let pages = load_pages(pdf, self.max_pages)?;
        Ok(self.detect_pages(&pages))
    }
}

/// Blank lines are skipped; a single-cell line (title, footer, prose) or
/// the end of the page closes the current block.
fn split_blocks(text: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();

    let mut close = |block: &mut Vec<Vec<String>>| {
        let done = std::mem::take(block);
        if done.len() >= 2 {
            tables.push(RawTable::from_strings(done));
        }
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<String> = COLUMN_GAP
            .split(line)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect();
        if cells.len() < 2 {
            close(&mut block);
        } else {
            block.push(cells);
        }
    }
    close(&mut block);

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::TableInterpreter;
    use crate::pdf::fixtures::statement_pdf;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn aligned() -> AlignedColumnDetector {
        AlignedColumnDetector::new(&PdfConfig::default())
    }

    #[test]
    fn test_split_spans() {
        let spans = split_spans("01/02/2024  Coffee Shop     4.50", 2);
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["01/02/2024", "Coffee Shop", "4.50"]);
        assert_eq!((spans[1].start, spans[1].end), (12, 23));

        assert_eq!(split_spans("a\tb", 4).len(), 2);
        assert!(split_spans("   ", 2).is_empty());
    }

    #[test]
    fn test_aligned_columns_keep_blank_cells_absent() {
        let page = "\
ACME BANK
Date        Description      Debit     Credit    Balance
2024-01-02  Salary                     1000.00   1000.00
2024-01-03  Coffee Shop       4.50                995.50
Page 1 of 1";
        let tables = aligned().detect_pages(&[page]);
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.len(), 3);
        assert_eq!(table.row_texts(0), vec!["Date", "Description", "Debit", "Credit", "Balance"]);
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.cell(1, 3), Some("1000.00"));
        assert_eq!(table.cell(2, 2), Some("4.50"));
        assert_eq!(table.cell(2, 3), None);
    }

    #[test]
    fn test_aligned_needs_enough_cells() {
        let page = "Dear customer\nyour statement  is attached\nThanks";
        assert!(aligned().detect_pages(&[page]).is_empty());
    }

    #[test]
    fn test_whitespace_grid_blocks() {
        let page = "\
Statement

Date  Description  Debit  Credit  Balance
2024-01-02  Salary  0.00  1000.00  1000.00

Closing remarks";
        let tables = WhitespaceGridDetector::new(&PdfConfig::default()).detect_pages(&[page]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].cell(1, 3), Some("1000.00"));
        assert_eq!(tables[0].num_cols(), 5);
    }

    #[test]
    fn test_whitespace_grid_ignores_blank_lines_between_rows() {
        let page = "\
Date  Description  Debit  Credit  Balance

2024-01-02  Salary  0.00  1000.00  1000.00

2024-01-03  Coffee Shop  4.50  0.00  995.50
Page 1 of 1";
        let tables = WhitespaceGridDetector::new(&PdfConfig::default()).detect_pages(&[page]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[0].cell(2, 1), Some("Coffee Shop"));
    }

    fn td_statement() -> Vec<u8> {
        statement_pdf(&[
            &[(50, "ACME BANK")],
            &[(50, "Date"), (130, "Description"), (330, "Debit"), (400, "Credit"), (480, "Balance")],
            &[(50, "2024-01-02"), (130, "Salary"), (400, "1000.00"), (480, "1000.00")],
            &[(50, "2024-01-03"), (130, "Coffee Shop"), (330, "4.50"), (480, "995.50")],
            &[(50, "Page 1 of 1")],
        ])
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_aligned_detects_cells_placed_by_td() {
        let tables = aligned().detect(&td_statement()).unwrap();
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.row_texts(0), vec!["Date", "Description", "Debit", "Credit", "Balance"]);
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.cell(2, 1), Some("Coffee Shop"));
        assert_eq!(table.cell(2, 3), None);

        let txns = TableInterpreter::default().interpret_all(&tables);
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].description, "Salary");
        assert_eq!(txns[0].credit, dec("1000.00"));
        assert_eq!(txns[1].debit, dec("4.50"));
        assert_eq!(txns[1].balance, dec("995.50"));
    }

    #[test]
    fn test_whitespace_grid_detects_filled_rows_placed_by_td() {
        let pdf = statement_pdf(&[
            &[(50, "Statement of account")],
            &[(50, "Date"), (130, "Description"), (330, "Debit"), (400, "Credit"), (480, "Balance")],
            &[(50, "2024-01-02"), (130, "Salary"), (330, "0.00"), (400, "1000.00"), (480, "1000.00")],
            &[(50, "2024-01-03"), (130, "Coffee Shop"), (330, "4.50"), (400, "0.00"), (480, "995.50")],
        ]);
        let tables = WhitespaceGridDetector::new(&PdfConfig::default()).detect(&pdf).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 3);

        let txns = TableInterpreter::default().interpret_all(&tables);
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[1].description, "Coffee Shop");
        assert_eq!(txns[1].debit, dec("4.50"));
    }

    #[test]
    fn test_max_pages_zero_scans_every_page() {
        let config = PdfConfig {
            max_pages: 0,
            ..PdfConfig::default()
        };
        assert_eq!(AlignedColumnDetector::new(&config).detect(&td_statement()).unwrap().len(), 1);
    }

    #[test]
    fn test_detect_rejects_non_pdf() {
        assert!(aligned().detect(b"plain text").is_err());
    }
}
