//! PDF processing: positioned text, page images and table detection.

mod extractor;
#[cfg(test)]
pub(crate) mod fixtures;
mod layout;
mod tables;

pub use extractor::PdfExtractor;
pub use layout::{layout_page_texts, render_layout, Glyph};
pub use tables::{split_spans, AlignedColumnDetector, TableDetector, TextSpan, WhitespaceGridDetector};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Layout-preserving text of the first `max_pages` pages (0 = all).
    fn extract_page_layouts(&self, max_pages: usize) -> Result<Vec<String>>;

    /// Render a page (1-indexed) as an image.
    fn render_page(&self, page: u32) -> Result<DynamicImage>;
}
