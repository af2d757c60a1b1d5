//! LLM collaborator turning filtered OCR text into transaction JSON.

use serde_json::Value;

use crate::error::LlmError;

/// Extracts transactions from free text.
///
/// The expected reply is a JSON object with a `transactions` array whose
/// entries carry `Date`, `Description`, `Debit`, `Credit` and `Balance`
/// keys. Implementations return whatever JSON they received; validation
/// happens in [`crate::reconcile`].
pub trait TransactionLlm: Send + Sync {
    fn extract_transactions(&self, text: &str) -> Result<Value, LlmError>;
}

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str = "You reply with one raw JSON object and nothing else.";

/// Build the user message for a block of filtered statement text.
pub fn build_prompt(text: &str) -> String {
    format!(
        r#"The text below was read by OCR from a bank statement and may be noisy.
List every individual transaction in it. Skip headers, totals and summary lines.
A transaction's description can continue on the following lines; join those lines into one description.

Reply with a JSON object holding a single key "transactions": an array of objects with exactly the keys
"Date", "Description", "Debit", "Credit" and "Balance".
- Copy dates as written on the statement.
- Debit, Credit and Balance are plain numbers without currency symbols or thousands separators, or null when absent.
- When unsure whether a line is a transaction, include it.

Example input:
Date Description Withdrawals ($) Deposits ($) Balance ($)
5 Apr e-Transfer - Autodeposit ~ 125.00 5,630.00
Online Banking payment - 2850 VISA TD BANK 500.00

Example reply:
{{"transactions": [
  {{"Date": "5 Apr", "Description": "e-Transfer - Autodeposit", "Debit": 125.00, "Credit": null, "Balance": 5630.00}},
  {{"Date": null, "Description": "Online Banking payment - 2850 VISA TD BANK", "Debit": 500.00, "Credit": null, "Balance": null}}
]}}

Statement text:
---
{text}
---"#
    )
}

#[cfg(feature = "openai")]
pub use openai::OpenAiExtractor;

#[cfg(feature = "openai")]
mod openai {
    use std::time::Duration;

    use reqwest::blocking::Client;
    use reqwest::header::AUTHORIZATION;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use tracing::{debug, info, warn};

    use super::{build_prompt, TransactionLlm, SYSTEM_PROMPT};
    use crate::error::LlmError;
    use crate::models::config::LlmConfig;

    #[derive(Serialize)]
    struct Msg<'a> {
        role: &'a str,
        content: &'a str,
    }

    #[derive(Serialize)]
    struct ResponseFormat {
        #[serde(rename = "type")]
        kind: &'static str,
    }

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        messages: Vec<Msg<'a>>,
        temperature: f32,
        response_format: ResponseFormat,
    }

    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: MsgOut,
    }

    #[derive(Deserialize)]
    struct MsgOut {
        content: Option<String>,
    }

    /// OpenAI-compatible chat completions client in JSON mode.
    pub struct OpenAiExtractor {
        client: Client,
        config: LlmConfig,
        api_key: String,
    }

    impl OpenAiExtractor {
        /// Build a client, reading the API key from `config.api_key_env`.
        pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
            let api_key = std::env::var(&config.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
            Self::with_api_key(config, api_key)
        }

        pub fn with_api_key(config: LlmConfig, api_key: String) -> Result<Self, LlmError> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| LlmError::Request(e.to_string()))?;

            Ok(Self {
                client,
                config,
                api_key,
            })
        }
    }

    impl TransactionLlm for OpenAiExtractor {
        fn extract_transactions(&self, text: &str) -> Result<Value, LlmError> {
            let prompt = build_prompt(text);
            let body = Req {
                model: &self.config.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    Msg {
                        role: "user",
                        content: &prompt,
                    },
                ],
                temperature: self.config.temperature,
                response_format: ResponseFormat { kind: "json_object" },
            };

            info!("Requesting transaction extraction from {}", self.config.model);
            let response = self
                .client
                .post(&self.config.endpoint)
                .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .map_err(|e| LlmError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                warn!("LLM endpoint returned {}", status);
                return Err(LlmError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let resp: Resp = response.json().map_err(|e| LlmError::Malformed(e.to_string()))?;
            let content = resp
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| LlmError::Malformed("response has no message content".to_string()))?;

            debug!("LLM reply: {} chars", content.len());
            serde_json::from_str(&content).map_err(|e| LlmError::Malformed(e.to_string()))
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_keys() {
        let prompt = build_prompt("02 Jan SALARY 1000.00");
        assert!(prompt.contains("---\n02 Jan SALARY 1000.00\n---"));
        for key in ["\"Date\"", "\"Description\"", "\"Debit\"", "\"Credit\"", "\"Balance\""] {
            assert!(prompt.contains(key), "missing {}", key);
        }
    }
}
