//! Table-to-transactions conversion.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::error::ExtractionError;
use crate::header::{HeaderLocator, HeaderSearch};
use crate::models::config::ExtractionConfig;
use crate::models::transaction::{CanonicalField, Transaction};
use crate::normalize::{normalize_amount, normalize_date_with, parse_amount, DateOrder};
use crate::table::{HeaderMap, RawTable};

/// Converts the data rows of a located table into transactions.
#[derive(Debug, Clone, Default)]
pub struct TableConverter {
    date_order: DateOrder,
    merge_wrapped: bool,
}

impl TableConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set numeric date resolution.
    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Fold dateless, amount-less description rows into the previous transaction.
    pub fn with_wrapped_descriptions(mut self, merge: bool) -> Self {
        self.merge_wrapped = merge;
        self
    }

    /// Convert every row after `header_row`.
    ///
    /// Rows whose date does not normalize are dropped; source order is kept.
    pub fn convert(&self, table: &RawTable, header_row: usize, map: &HeaderMap) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = Vec::new();
        let mut dropped = 0usize;

        for (idx, row) in table.rows().iter().enumerate().skip(header_row + 1) {
            let cell = |field: CanonicalField| {
                map.get(field)
                    .and_then(|col| row.get(col))
                    .and_then(|c| c.as_deref())
            };

            let description = cell(CanonicalField::Description)
                .map(collapse_whitespace)
                .unwrap_or_default();

            let date = match cell(CanonicalField::Date).and_then(|s| normalize_date_with(s, self.date_order)) {
                Some(date) => date,
                None => {
                    if self.merge_wrapped && is_continuation(&cell, &description) {
                        if let Some(last) = transactions.last_mut() {
                            trace!("Row {} merged into previous description", idx);
                            last.append_description(&description);
                            continue;
                        }
                    }
                    trace!("Row {} dropped: no usable date", idx);
                    dropped += 1;
                    continue;
                }
            };

            let amount = |field| cell(field).map(normalize_amount).unwrap_or(Decimal::ZERO);

            transactions.push(
                Transaction::new(date, description)
                    .with_debit(amount(CanonicalField::Debit).abs())
                    .with_credit(amount(CanonicalField::Credit).abs())
                    .with_balance(amount(CanonicalField::Balance)),
            );
        }

        debug!(
            "Converted {} transactions ({} rows dropped)",
            transactions.len(),
            dropped
        );
        transactions
    }
}

/// Date cell blank, no amounts, some description text.
fn is_continuation<'a>(cell: &impl Fn(CanonicalField) -> Option<&'a str>, description: &str) -> bool {
    let date_blank = cell(CanonicalField::Date).is_none_or(|s| s.trim().is_empty());
    let no_amounts = [CanonicalField::Debit, CanonicalField::Credit, CanonicalField::Balance]
        .into_iter()
        .all(|field| cell(field).and_then(parse_amount).is_none());
    date_blank && no_amounts && !description.is_empty()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Outcome of interpreting one untrusted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// The table was recognised and converted (possibly to zero rows).
    Converted(Vec<Transaction>),
    /// No header row inside the scan window.
    NoHeader,
    /// A header was found but required columns are missing.
    Rejected(Vec<CanonicalField>),
}

/// Header localization plus conversion, configured once per document.
#[derive(Debug, Clone)]
pub struct TableInterpreter {
    locator: HeaderLocator,
    converter: TableConverter,
}

impl TableInterpreter {
    pub fn new(locator: HeaderLocator, converter: TableConverter) -> Self {
        Self { locator, converter }
    }

    /// Build from extraction settings and an already compiled pattern set.
    pub fn from_config(patterns: crate::columns::ColumnPatternSet, config: &ExtractionConfig) -> Self {
        Self {
            locator: HeaderLocator::new(patterns).with_scan_rows(config.header_scan_rows),
            converter: TableConverter::new()
                .with_date_order(config.date_order)
                .with_wrapped_descriptions(config.merge_wrapped_descriptions),
        }
    }

    /// Interpret a table whose header row is unknown.
    pub fn interpret(&self, table: &RawTable) -> TableOutcome {
        match self.locator.locate(table) {
            HeaderSearch::Found { row, map } => {
                let missing = map.missing_required();
                if !missing.is_empty() {
                    debug!("Table rejected, missing columns: {:?}", missing);
                    return TableOutcome::Rejected(missing);
                }
                TableOutcome::Converted(self.converter.convert(table, row, &map))
            }
            HeaderSearch::NotFound => TableOutcome::NoHeader,
        }
    }

    /// Interpret several tables independently and concatenate their transactions.
    pub fn interpret_all(&self, tables: &[RawTable]) -> Vec<Transaction> {
        tables
            .iter()
            .filter_map(|table| match self.interpret(table) {
                TableOutcome::Converted(txns) => Some(txns),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Interpret a table whose row 0 is a trusted header (spreadsheets).
    pub fn interpret_trusted(&self, table: &RawTable) -> Result<Vec<Transaction>, ExtractionError> {
        if table.is_empty() {
            return Err(ExtractionError::EmptyTable);
        }
        let map = self.locator.patterns().build_header_map(&table.row_texts(0));
        let missing = map.missing_required();
        if !missing.is_empty() {
            return Err(ExtractionError::MissingColumns(missing));
        }
        Ok(self.converter.convert(table, 0, &map))
    }
}

impl Default for TableInterpreter {
    fn default() -> Self {
        Self::new(HeaderLocator::default(), TableConverter::default())
    }
}
