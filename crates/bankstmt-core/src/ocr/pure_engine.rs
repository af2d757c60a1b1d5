//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::sync::Mutex;
use std::time::Instant;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;
use crate::pdf::{PdfExtractor, PdfProcessor};

use super::{reading_order_text, retain_confident, OcrTextSource, TextBox};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config`.
    pub fn from_config(config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("{} not found", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            config,
        })
    }

    /// Recognize text boxes in one image.
    pub fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextBox>, OcrError> {
        let engine = self
            .engine
            .lock()
            .map_err(|_| OcrError::Recognition("OCR engine lock poisoned".to_string()))?;

        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        Ok(results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect())
    }

    fn downscale(&self, image: DynamicImage) -> DynamicImage {
        let factor = self.config.downscale.max(1);
        if factor == 1 {
            return image;
        }
        let (width, height) = image.dimensions();
        image.resize(
            (width / factor).max(1),
            (height / factor).max(1),
            FilterType::Triangle,
        )
    }
}

impl OcrTextSource for PureOcrEngine {
    fn extract_text(&self, pdf: &[u8]) -> Result<String, OcrError> {
        let start = Instant::now();
        let extractor = PdfExtractor::from_bytes(pdf).map_err(|e| OcrError::NoImages(e.to_string()))?;
        let pages = match self.config.max_pages {
            0 => extractor.page_count(),
            max => extractor.page_count().min(max),
        };

        let mut texts = Vec::new();
        for page in 1..=pages {
            let image = match extractor.render_page(page) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping page {} for OCR: {}", page, e);
                    continue;
                }
            };

            let image = self.downscale(image);
            let mut boxes = retain_confident(self.recognize(&image)?, self.config.min_confidence);
            texts.push(reading_order_text(&mut boxes, 20.0 / self.config.downscale.max(1) as f32));
        }

        if texts.is_empty() {
            return Err(OcrError::NoImages(format!("no renderable page in first {}", pages)));
        }

        info!("OCR complete: {} pages in {}ms", texts.len(), start.elapsed().as_millis());
        Ok(texts.join("\n"))
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_models_is_model_load_error() {
        let config = OcrConfig {
            model_dir: "/nonexistent/bankstmt-models".into(),
            ..OcrConfig::default()
        };
        assert!(matches!(
            PureOcrEngine::from_config(config),
            Err(OcrError::ModelLoad(_))
        ));
    }
}
