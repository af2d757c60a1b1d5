//! Common regex patterns for statement normalization and line filtering.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Year-first dates, optionally followed by a time ("2024-01-05 00:00:00")
    pub static ref DATE_YMD: Regex = Regex::new(
        r"^(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})(?:[T\s].*)?$"
    ).unwrap();

    // Day/month-first numeric dates ("05/01/2024", "5.1.24")
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"^(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})(?:[T\s].*)?$"
    ).unwrap();

    // Ordinal suffix on a day number ("5th", "21st")
    pub static ref DAY_ORDINAL: Regex = Regex::new(
        r"^(\d{1,2})(?:st|nd|rd|th)$"
    ).unwrap();

    // Amount written with a decimal comma ("1.234,56", "12,50")
    pub static ref DECIMAL_COMMA: Regex = Regex::new(
        r",\d{2}$"
    ).unwrap();

    // OCR lines that carry a date-like token ("5 Apr", "Apr 5", "2024-04-05")
    pub static ref OCR_DATE_LIKE: Regex = Regex::new(
        r"\b(\d{1,2}\s*[A-Za-z]{3,}|[A-Za-z]{3,}\s*\d{1,2}|\d{4}-\d{2}-\d{2})\b"
    ).unwrap();

    // OCR lines that carry a two-decimal money value
    pub static ref OCR_MONEY_LIKE: Regex = Regex::new(
        r"\d+\.\d{2}"
    ).unwrap();

    // Cell separator in whitespace-aligned text tables
    pub static ref COLUMN_GAP: Regex = Regex::new(
        r"\s{2,}|\t+"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_line_patterns() {
        assert!(OCR_DATE_LIKE.is_match("5 Apr e-Transfer"));
        assert!(OCR_DATE_LIKE.is_match("2024-04-05 POS"));
        assert!(OCR_MONEY_LIKE.is_match("Online Banking payment 500.00"));
        assert!(!OCR_MONEY_LIKE.is_match("Page 1 of 3"));
    }

    #[test]
    fn test_column_gap_split() {
        let cells: Vec<&str> = COLUMN_GAP.split("Date  Description   Debit").collect();
        assert_eq!(cells, vec!["Date", "Description", "Debit"]);
    }
}
