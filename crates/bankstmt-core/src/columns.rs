//! Fuzzy column matching: header spellings to canonical fields.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::StatementError;
use crate::models::transaction::CanonicalField;
use crate::table::HeaderMap;

/// Built-in header spellings per field.
pub const DEFAULT_PATTERNS: [(CanonicalField, &[&str]); 5] = [
    (CanonicalField::Date, &["date", "txn date", "transaction date"]),
    (
        CanonicalField::Description,
        &["particulars", "description", "details", "transaction details", "narration", "desc"],
    ),
    (CanonicalField::Debit, &["debit", "withdrawal", "withdrawals", "withdrawn"]),
    (CanonicalField::Credit, &["credit", "deposit", "deposits"]),
    (CanonicalField::Balance, &["balance", "closing balance", "available balance"]),
];

lazy_static! {
    static ref DEFAULT_SET: ColumnPatternSet = ColumnPatternSet::from_pairs(
        DEFAULT_PATTERNS.iter().map(|(field, pats)| (*field, pats.iter().copied()))
    ).unwrap();
}

/// Ordered, case-insensitive, whole-word header patterns per canonical field.
#[derive(Debug, Clone)]
pub struct ColumnPatternSet {
    fields: Vec<(CanonicalField, Vec<Regex>)>,
}

impl ColumnPatternSet {
    /// Compile a pattern set. Fields are always tested in [`CanonicalField::ALL`] order.
    pub fn from_pairs<'a, I, P>(pairs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (CanonicalField, P)>,
        P: IntoIterator<Item = &'a str>,
    {
        let mut fields: Vec<(CanonicalField, Vec<Regex>)> =
            CanonicalField::ALL.iter().map(|f| (*f, Vec::new())).collect();

        for (field, patterns) in pairs {
            let slot = field_slot(&mut fields, field);
            for pattern in patterns {
                slot.push(compile_pattern(pattern)?);
            }
        }

        Ok(Self { fields })
    }

    /// Append extra patterns (from configuration) after the existing ones.
    pub fn with_extra(
        mut self,
        extra: &BTreeMap<CanonicalField, Vec<String>>,
    ) -> Result<Self, StatementError> {
        for (field, patterns) in extra {
            let slot = field_slot(&mut self.fields, *field);
            for pattern in patterns {
                let regex = compile_pattern(pattern).map_err(|e| {
                    StatementError::Config(format!("invalid {} column pattern '{}': {}", field, pattern, e))
                })?;
                slot.push(regex);
            }
        }
        Ok(self)
    }

    /// Map a header cell to a canonical field.
    ///
    /// The first field (in Date, Description, Debit, Credit, Balance order)
    /// with a pattern matching the trimmed, lower-cased text wins.
    pub fn match_column(&self, header: &str) -> Option<CanonicalField> {
        let text = header.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        self.fields
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&text)))
            .map(|(field, _)| *field)
    }

    /// Map a header row, keeping the first (leftmost) column per field.
    pub fn build_header_map<S: AsRef<str>>(&self, headers: &[S]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(field) = self.match_column(header.as_ref()) {
                map.insert(field, idx);
            }
        }
        map
    }
}

impl Default for ColumnPatternSet {
    fn default() -> Self {
        DEFAULT_SET.clone()
    }
}

fn field_slot(fields: &mut [(CanonicalField, Vec<Regex>)], field: CanonicalField) -> &mut Vec<Regex> {
    let idx = CanonicalField::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or_default();
    &mut fields[idx].1
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b(?:{})\b", pattern))
}
