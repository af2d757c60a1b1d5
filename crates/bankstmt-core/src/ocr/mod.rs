//! OCR text sources for scanned statements.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OcrError;

/// Produces one plain-text blob for a PDF document.
pub trait OcrTextSource: Send + Sync {
    fn extract_text(&self, pdf: &[u8]) -> Result<String, OcrError>;
}

/// A recognized text box with its quadrilateral coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Drop boxes recognized below `min_confidence`.
pub fn retain_confident(mut boxes: Vec<TextBox>, min_confidence: f32) -> Vec<TextBox> {
    let before = boxes.len();
    boxes.retain(|b| b.confidence >= min_confidence);
    if boxes.len() < before {
        debug!("Dropped {} low-confidence text boxes", before - boxes.len());
    }
    boxes
}

/// Sort boxes top-to-bottom, left-to-right and join their text with newlines.
///
/// Boxes whose tops fall in the same `row_height` band count as one row.
pub fn reading_order_text(boxes: &mut [TextBox], row_height: f32) -> String {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();
        let row_a = (ay / row_height) as i32;
        let row_b = (by / row_height) as i32;

        row_a
            .cmp(&row_b)
            .then_with(|| ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
    });

    boxes
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
