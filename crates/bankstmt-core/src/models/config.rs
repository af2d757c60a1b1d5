//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::models::transaction::CanonicalField;
use crate::normalize::dates::DateOrder;

/// Default number of leading rows scanned for a header.
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 5;

/// Default upload size limit (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Main configuration for bank statement extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// Input validation.
    pub input: InputConfig,

    /// Table interpretation and normalization.
    pub extraction: ExtractionConfig,

    /// PDF table detection.
    pub pdf: PdfConfig,

    /// OCR text source.
    pub ocr: OcrConfig,

    /// LLM transaction extractor.
    pub llm: LlmConfig,

    /// Strategy pipeline.
    pub pipeline: PipelineConfig,
}

/// Input document limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum accepted document size in bytes (0 = unlimited).
    pub max_file_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Table interpretation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many leading rows of an untrusted table may hold the header.
    pub header_scan_rows: usize,

    /// Resolution of numeric day/month ambiguity.
    pub date_order: DateOrder,

    /// Fold dateless description-only rows into the previous transaction.
    pub merge_wrapped_descriptions: bool,

    /// Additional header patterns appended to the built-in set.
    pub extra_column_patterns: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            date_order: DateOrder::DayFirst,
            merge_wrapped_descriptions: false,
            extra_column_patterns: BTreeMap::new(),
        }
    }
}

/// PDF table detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to scan for tables (0 = unlimited).
    pub max_pages: usize,

    /// Minimum run of spaces separating two columns.
    pub min_column_gap: usize,

    /// Minimum cells on a line for it to shape the column layout.
    pub min_layout_cells: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            min_column_gap: 2,
            min_layout_cells: 3,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Pages to OCR (0 = all).
    pub max_pages: u32,

    /// Divide page image dimensions by this factor before OCR (1 = no scaling).
    pub downscale: u32,

    /// Keep `[UNK]` tokens in recognized text.
    pub keep_unk: bool,

    /// Text boxes recognized below this confidence are discarded.
    pub min_confidence: f32,
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            max_pages: 1,
            downscale: 2,
            keep_unk: false,
            min_confidence: 0.5,
        }
    }
}

/// LLM extractor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat completions endpoint.
    pub endpoint: String,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4-1106-preview".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Strategy pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the aligned-column layout detector.
    pub enable_layout_tables: bool,

    /// Run the whitespace-grid detector.
    pub enable_grid_tables: bool,

    /// Run the OCR/LLM fallback.
    pub enable_ocr_llm: bool,

    /// Return the raw OCR text alongside the result. Only set when the
    /// OCR/LLM strategy actually ran; table strategies never OCR.
    pub include_ocr_text: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_layout_tables: true,
            enable_grid_tables: true,
            enable_ocr_llm: true,
            include_ocr_text: false,
        }
    }
}

impl StatementConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: StatementConfig = serde_json::from_str(
            r#"{ "extraction": { "header_scan_rows": 8, "date_order": "month_first" } }"#,
        )
        .unwrap();

        assert_eq!(config.extraction.header_scan_rows, 8);
        assert_eq!(config.extraction.date_order, DateOrder::MonthFirst);
        assert!(!config.extraction.merge_wrapped_descriptions);
        assert_eq!(config.input.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(config.pipeline.enable_ocr_llm);
    }

    #[test]
    fn test_extra_patterns_keyed_by_field() {
        let config: StatementConfig = serde_json::from_str(
            r#"{ "extraction": { "extra_column_patterns": { "debit": ["paid out"] } } }"#,
        )
        .unwrap();

        assert_eq!(
            config.extraction.extra_column_patterns.get(&CanonicalField::Debit),
            Some(&vec!["paid out".to_string()])
        );
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("bankstmt-config-{}.json", std::process::id()));
        let mut config = StatementConfig::default();
        config.pipeline.include_ocr_text = true;
        config.save(&path).unwrap();

        let loaded = StatementConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(loaded.pipeline.include_ocr_text);
    }
}
