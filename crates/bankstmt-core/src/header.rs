//! Header row localization for tables with untrusted header placement.

use tracing::{debug, trace};

use crate::columns::ColumnPatternSet;
use crate::models::config::DEFAULT_HEADER_SCAN_ROWS;
use crate::table::{HeaderMap, RawTable};

/// Outcome of a bounded header search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSearch {
    /// Header found at `row`.
    Found { row: usize, map: HeaderMap },
    /// No row inside the scan window qualified.
    NotFound,
}

impl HeaderSearch {
    pub fn is_found(&self) -> bool {
        matches!(self, HeaderSearch::Found { .. })
    }
}

/// Finds the true header row among banner/title rows of a loosely parsed table.
#[derive(Debug, Clone)]
pub struct HeaderLocator {
    patterns: ColumnPatternSet,
    scan_rows: usize,
}

impl HeaderLocator {
    /// Create a locator scanning the default number of rows.
    pub fn new(patterns: ColumnPatternSet) -> Self {
        Self {
            patterns,
            scan_rows: DEFAULT_HEADER_SCAN_ROWS,
        }
    }

    /// Set how many leading rows may hold the header.
    pub fn with_scan_rows(mut self, scan_rows: usize) -> Self {
        self.scan_rows = scan_rows;
        self
    }

    pub fn patterns(&self) -> &ColumnPatternSet {
        &self.patterns
    }

    /// Return the earliest row within the window whose header map has a date
    /// column and a debit or credit column.
    pub fn locate(&self, table: &RawTable) -> HeaderSearch {
        for row in 0..self.scan_rows.min(table.len()) {
            let map = self.patterns.build_header_map(&table.row_texts(row));
            trace!("Header candidate row {}: {} fields matched", row, map.len());

            if map.has_date_and_amount() {
                debug!("Header located at row {}", row);
                return HeaderSearch::Found { row, map };
            }
        }

        debug!("No header found in first {} rows", self.scan_rows.min(table.len()));
        HeaderSearch::NotFound
    }
}

impl Default for HeaderLocator {
    fn default() -> Self {
        Self::new(ColumnPatternSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::CanonicalField;
    use pretty_assertions::assert_eq;

    fn banner_table() -> RawTable {
        RawTable::from_strings(vec![
            vec!["ACME BANK", "", "", "", ""],
            vec!["Statement of account", "Date range", "", "", ""],
            vec!["Date", "Description", "Debit", "Credit", "Balance"],
            vec!["2024-01-02", "Salary", "", "1000.00", "1000.00"],
        ])
    }

    #[test]
    fn test_finds_header_after_banner_rows() {
        let locator = HeaderLocator::default().with_scan_rows(3);
        match locator.locate(&banner_table()) {
            HeaderSearch::Found { row, map } => {
                assert_eq!(row, 2);
                assert_eq!(map.get(CanonicalField::Date), Some(0));
                assert_eq!(map.get(CanonicalField::Balance), Some(4));
            }
            HeaderSearch::NotFound => panic!("header not found"),
        }
    }

    #[test]
    fn test_header_outside_window_is_not_found() {
        let locator = HeaderLocator::default().with_scan_rows(2);
        assert_eq!(locator.locate(&banner_table()), HeaderSearch::NotFound);
    }

    #[test]
    fn test_date_without_amount_column_does_not_qualify() {
        let table = RawTable::from_strings(vec![
            vec!["Date", "Description", "Reference"],
            vec!["2024-01-02", "Salary", "X1"],
        ]);
        assert!(!HeaderLocator::default().locate(&table).is_found());
    }

    #[test]
    fn test_credit_only_header_qualifies() {
        let table = RawTable::from_strings(vec![
            vec!["Txn Date", "Narration", "Deposit"],
            vec!["2024-01-02", "Salary", "10.00"],
        ]);
        assert!(matches!(
            HeaderLocator::default().locate(&table),
            HeaderSearch::Found { row: 0, .. }
        ));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(HeaderLocator::default().locate(&RawTable::default()), HeaderSearch::NotFound);
    }
}
