//! Raw table grid and header map.

use std::collections::BTreeMap;

use crate::models::transaction::CanonicalField;

/// An untyped grid of cells as produced by a spreadsheet reader or a PDF
/// table detector.
///
/// `None` is an absent cell (the row is shorter than the column, or the
/// detector found nothing at that position); `Some("")` is a present but
/// empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Build a table from rows of optional cells.
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Build a table where every cell is present.
    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Option<String>]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the widest row.
    pub fn num_cols(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Cell at a position; `None` when absent.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    /// Header texts of a row, absent cells read as empty.
    pub fn row_texts(&self, index: usize) -> Vec<&str> {
        self.row(index)
            .map(|r| r.iter().map(|c| c.as_deref().unwrap_or("")).collect())
            .unwrap_or_default()
    }
}

/// Injective mapping from canonical field to column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: BTreeMap<CanonicalField, usize>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `column` for `field`.
    ///
    /// Returns `false` and leaves the map unchanged when either the field or
    /// the column is already claimed.
    pub fn insert(&mut self, field: CanonicalField, column: usize) -> bool {
        if self.columns.contains_key(&field) || self.columns.values().any(|&c| c == column) {
            return false;
        }
        self.columns.insert(field, column);
        true
    }

    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        self.columns.iter().map(|(f, c)| (*f, *c))
    }

    /// Date plus at least one of debit/credit; enough to recognise a header row.
    pub fn has_date_and_amount(&self) -> bool {
        self.contains(CanonicalField::Date)
            && (self.contains(CanonicalField::Debit) || self.contains(CanonicalField::Credit))
    }

    /// Fields required for a table to be accepted that this map lacks.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        let mut missing = Vec::new();
        if !self.contains(CanonicalField::Date) {
            missing.push(CanonicalField::Date);
        }
        if !self.contains(CanonicalField::Description) {
            missing.push(CanonicalField::Description);
        }
        if !self.contains(CanonicalField::Debit) && !self.contains(CanonicalField::Credit) {
            missing.push(CanonicalField::Debit);
            missing.push(CanonicalField::Credit);
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absent_vs_empty_cells() {
        let table = RawTable::new(vec![
            vec![Some("a".to_string()), Some(String::new())],
            vec![Some("b".to_string())],
        ]);

        assert_eq!(table.cell(0, 1), Some(""));
        assert_eq!(table.cell(1, 1), None);
        assert_eq!(table.num_cols(), 2);
        assert_eq!(table.row_texts(1), vec!["b"]);
    }

    #[test]
    fn test_header_map_is_injective() {
        let mut map = HeaderMap::new();
        assert!(map.insert(CanonicalField::Date, 0));
        assert!(!map.insert(CanonicalField::Date, 1));
        assert!(!map.insert(CanonicalField::Debit, 0));
        assert!(map.insert(CanonicalField::Debit, 2));
        assert_eq!(map.get(CanonicalField::Date), Some(0));
        assert_eq!(map.get(CanonicalField::Debit), Some(2));
    }

    #[test]
    fn test_missing_required() {
        let mut map = HeaderMap::new();
        map.insert(CanonicalField::Date, 0);
        map.insert(CanonicalField::Description, 1);
        assert_eq!(
            map.missing_required(),
            vec![CanonicalField::Debit, CanonicalField::Credit]
        );

        map.insert(CanonicalField::Credit, 2);
        assert!(map.missing_required().is_empty());
    }
}
