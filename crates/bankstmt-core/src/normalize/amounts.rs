//! Amount normalization for statement cells.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::DECIMAL_COMMA;

/// Normalize an amount cell, defaulting to zero.
///
/// Zero is the caller's default for a blank or unreadable cell, not a claim
/// that the statement printed zero. Use [`parse_amount`] to tell them apart.
pub fn normalize_amount(raw: &str) -> Decimal {
    parse_amount(raw).unwrap_or(Decimal::ZERO)
}

/// Parse an amount cell such as `"1,234.56"`, `"$ 4.50"`, `"(12.00)"` or `"12,50"`.
///
/// Currency symbols, thousands separators and any other characters apart
/// from digits, the sign and the decimal point are discarded.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let negative_marker = (trimmed.starts_with('(') && trimmed.ends_with(')')) || trimmed.ends_with('-');

    // Decimal comma: "1.234,56" or "12,50"
    let source = if DECIMAL_COMMA.is_match(trimmed) && trimmed.rfind(',') > trimmed.rfind('.') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    let mut cleaned: String = source
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();

    if negative_marker {
        cleaned.retain(|c| c != '-');
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative_marker { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(normalize_amount("1,234.56"), dec("1234.56"));
        assert_eq!(normalize_amount("12,345,678.90"), dec("12345678.90"));
    }

    #[test]
    fn test_blank_and_garbage_default_to_zero() {
        assert_eq!(normalize_amount(""), Decimal::ZERO);
        assert_eq!(normalize_amount("   "), Decimal::ZERO);
        assert_eq!(normalize_amount("N/A"), Decimal::ZERO);
        assert_eq!(normalize_amount("-"), Decimal::ZERO);
        assert_eq!(normalize_amount("1.2.3"), Decimal::ZERO);
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(normalize_amount("$ 4.50"), dec("4.50"));
        assert_eq!(normalize_amount("₹1,20,000.00"), dec("120000.00"));
        assert_eq!(normalize_amount("125.00 CR"), dec("125.00"));
    }

    #[test]
    fn test_negative_forms() {
        assert_eq!(normalize_amount("-15.00"), dec("-15.00"));
        assert_eq!(normalize_amount("(12.00)"), dec("-12.00"));
        assert_eq!(normalize_amount("12.00-"), dec("-12.00"));
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(normalize_amount("12,50"), dec("12.50"));
        assert_eq!(normalize_amount("1.234,56"), dec("1234.56"));
        assert_eq!(normalize_amount("1,234"), dec("1234"));
    }

    #[test]
    fn test_parse_amount_distinguishes_missing() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0.00"), Some(Decimal::ZERO));
    }
}
