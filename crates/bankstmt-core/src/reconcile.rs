//! OCR/LLM reconciliation: clean OCR text, keep transaction-like lines,
//! delegate to the LLM and validate what comes back.

use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::LlmError;
use crate::llm::TransactionLlm;
use crate::models::Transaction;
use crate::normalize::patterns::{OCR_DATE_LIKE, OCR_MONEY_LIKE};
use crate::normalize::{normalize_amount, normalize_date_with, DateOrder};

/// Trim every line and drop blank ones.
pub fn clean_ocr_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep lines that carry something date-like or money-like.
pub fn filter_transaction_lines(text: &str) -> String {
    text.lines()
        .filter(|line| OCR_DATE_LIKE.is_match(line) || OCR_MONEY_LIKE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn an LLM reply into transactions.
///
/// Anything other than an object with a `transactions` array yields no
/// transactions. Non-object entries are skipped. Dates that do not
/// normalize are kept verbatim in `raw_date`.
pub fn parse_llm_transactions(value: &Value, date_order: DateOrder) -> Vec<Transaction> {
    let Some(entries) = value.get("transactions").and_then(Value::as_array) else {
        warn!("LLM reply has no 'transactions' array");
        return Vec::new();
    };

    let transactions: Vec<Transaction> = entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| {
            let raw_date = entry.get("Date").and_then(text_value);
            let date = raw_date
                .as_deref()
                .and_then(|raw| normalize_date_with(raw, date_order));

            Transaction {
                date,
                raw_date: raw_date.filter(|raw| date.is_none() && !raw.is_empty()),
                description: entry.get("Description").and_then(text_value).unwrap_or_default(),
                debit: amount_value(entry.get("Debit")),
                credit: amount_value(entry.get("Credit")),
                balance: amount_value(entry.get("Balance")),
            }
        })
        .collect();

    if transactions.len() < entries.len() {
        debug!("Skipped {} non-object entries", entries.len() - transactions.len());
    }
    transactions
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn amount_value(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .unwrap_or(Decimal::ZERO),
        Some(Value::String(s)) => normalize_amount(s),
        _ => Decimal::ZERO,
    }
}

/// Runs OCR text through cleaning, filtering and the LLM collaborator.
#[derive(Clone)]
pub struct OcrLlmReconciler {
    llm: Arc<dyn TransactionLlm>,
    date_order: DateOrder,
}

impl OcrLlmReconciler {
    pub fn new(llm: Arc<dyn TransactionLlm>) -> Self {
        Self {
            llm,
            date_order: DateOrder::default(),
        }
    }

    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Reconcile OCR text into transactions. Empty input never reaches the LLM.
    pub fn reconcile(&self, ocr_text: &str) -> Result<Vec<Transaction>, LlmError> {
        let cleaned = clean_ocr_text(ocr_text);
        let filtered = filter_transaction_lines(&cleaned);
        if filtered.is_empty() {
            info!("No transaction-like lines in OCR text");
            return Ok(Vec::new());
        }

        debug!(
            "Sending {} of {} OCR lines to LLM",
            filtered.lines().count(),
            cleaned.lines().count()
        );
        let reply = self.llm.extract_transactions(&filtered)?;
        let transactions = parse_llm_transactions(&reply, self.date_order);
        info!("LLM extracted {} transactions", transactions.len());
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_clean_and_filter() {
        let raw = "  ACME BANK \n\n\nStatement period\n 5 Apr e-Transfer 125.00  \nPage 1\n2024-04-06 POS\nTotal 9.99\n";
        let cleaned = clean_ocr_text(raw);
        assert_eq!(
            cleaned,
            "ACME BANK\nStatement period\n5 Apr e-Transfer 125.00\nPage 1\n2024-04-06 POS\nTotal 9.99"
        );
        assert_eq!(
            filter_transaction_lines(&cleaned),
            "5 Apr e-Transfer 125.00\nPage 1\n2024-04-06 POS\nTotal 9.99"
        );
    }

    #[test]
    fn test_parse_pass_through() {
        let reply = json!({
            "transactions": [
                {"Date": "2024-04-05", "Description": "e-Transfer", "Debit": 125.0, "Credit": null, "Balance": "5,630.00"},
                "not an object",
                {"Date": null, "Description": null, "Debit": null, "Credit": 20, "Balance": null},
                {"Date": "5 Apr", "Description": "Payment", "Debit": "500.00"}
            ]
        });
        let txs = parse_llm_transactions(&reply, DateOrder::DayFirst);
        assert_eq!(txs.len(), 3);

        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 4, 5));
        assert_eq!(txs[0].debit, dec("125"));
        assert_eq!(txs[0].credit, Decimal::ZERO);
        assert_eq!(txs[0].balance, dec("5630.00"));

        assert_eq!(txs[1].date, None);
        assert_eq!(txs[1].raw_date, None);
        assert_eq!(txs[1].description, "");
        assert_eq!(txs[1].credit, dec("20"));

        assert_eq!(txs[2].date, None);
        assert_eq!(txs[2].raw_date.as_deref(), Some("5 Apr"));
        assert_eq!(txs[2].debit, dec("500.00"));
        assert_eq!(txs[2].balance, Decimal::ZERO);
    }

    #[test]
    fn test_malformed_replies_yield_nothing() {
        for reply in [
            json!([{"Date": "2024-01-01"}]),
            json!({"rows": []}),
            json!({"transactions": {"Date": "2024-01-01"}}),
            json!("transactions"),
        ] {
            assert!(parse_llm_transactions(&reply, DateOrder::DayFirst).is_empty(), "{}", reply);
        }
    }

    struct CountingLlm {
        calls: AtomicUsize,
    }

    impl TransactionLlm for CountingLlm {
        fn extract_transactions(&self, _text: &str) -> Result<Value, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"transactions": [{"Date": "2024-01-02", "Description": "Salary", "Credit": 1000.0}]}))
        }
    }

    #[test]
    fn test_reconciler_skips_llm_without_candidate_lines() {
        let llm = Arc::new(CountingLlm { calls: AtomicUsize::new(0) });
        let reconciler = OcrLlmReconciler::new(llm.clone());

        assert!(reconciler.reconcile("").unwrap().is_empty());
        assert!(reconciler.reconcile("ACME BANK\nThank you").unwrap().is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        let txs = reconciler.reconcile("2024-01-02 Salary 1000.00").unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }
}
