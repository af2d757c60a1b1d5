//! Canonical transaction records produced from bank statements.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the five fixed transaction attributes a statement column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    Description,
    Debit,
    Credit,
    Balance,
}

impl CanonicalField {
    /// All fields in matching priority order.
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Date,
        CanonicalField::Description,
        CanonicalField::Debit,
        CanonicalField::Credit,
        CanonicalField::Balance,
    ];

    /// Lower-case field name as used in output and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Description => "description",
            CanonicalField::Debit => "debit",
            CanonicalField::Credit => "credit",
            CanonicalField::Balance => "balance",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized statement transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Booking date; `None` only for pass-through records from the OCR/LLM path.
    pub date: Option<NaiveDate>,

    /// Source date text that could not be normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_date: Option<String>,

    /// Description, possibly merged from several source lines.
    pub description: String,

    /// Money out (non-negative).
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,

    /// Money in (non-negative).
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,

    /// Running balance after the transaction.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl Transaction {
    /// Create a dated transaction with zero amounts.
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            date: Some(date),
            raw_date: None,
            description: description.into(),
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    pub fn with_debit(mut self, debit: Decimal) -> Self {
        self.debit = debit;
        self
    }

    pub fn with_credit(mut self, credit: Decimal) -> Self {
        self.credit = credit;
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    /// Date as `YYYY-MM-DD`, falling back to the raw source text.
    pub fn date_string(&self) -> String {
        match (self.date, &self.raw_date) {
            (Some(date), _) => date.format("%Y-%m-%d").to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => String::new(),
        }
    }

    /// Append a wrapped continuation line to the description.
    pub fn append_description(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(text);
    }
}
