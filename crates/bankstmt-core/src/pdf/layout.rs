//! Layout-preserving page text rebuilt from glyph positions.
//!
//! The plain text layer collapses any horizontal gap into a single space,
//! which erases the column structure of a statement. Here every glyph is
//! recorded with its position and each line is re-typeset on a character
//! grid, so cells placed at the same x coordinate start at the same column
//! and column gaps survive as runs of spaces.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, trace};

use crate::error::PdfError;

/// Vertical distance, in glyph sizes, within which glyphs share a line.
const LINE_TOLERANCE: f64 = 0.5;

/// Gaps narrower than this (in glyph sizes) join glyphs of one word.
const WORD_GAP: f64 = 0.15;

/// Gaps at least this wide (in glyph sizes) separate cells.
const CELL_GAP: f64 = 0.8;

/// A positioned glyph in top-down page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub x: f64,
    pub y: f64,
    pub advance: f64,
    pub size: f64,
    pub text: String,
}

impl Glyph {
    pub fn new(x: f64, y: f64, advance: f64, size: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            advance,
            size,
            text: text.into(),
        }
    }

    fn end(&self) -> f64 {
        self.x + self.advance
    }
}

#[derive(Default)]
struct GlyphCollector {
    page_height: f64,
    current: Vec<Glyph>,
    pages: Vec<Vec<Glyph>>,
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.page_height = media_box.ury - media_box.lly;
        self.current.clear();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.pages.push(std::mem::take(&mut self.current));
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let scale = (trm.m11.hypot(trm.m12) * trm.m21.hypot(trm.m22)).sqrt();
        let size = font_size * scale;
        self.current.push(Glyph::new(
            trm.m31,
            self.page_height - trm.m32,
            width * size,
            size,
            char,
        ));
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Layout text for the first `max_pages` pages (0 = all) of an unencrypted PDF.
pub fn layout_page_texts(data: &[u8], max_pages: usize) -> Result<Vec<String>, PdfError> {
    let doc = pdf_extract::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let limit = match max_pages {
        0 => page_numbers.len(),
        n => n.min(page_numbers.len()),
    };
    if limit < page_numbers.len() {
        debug!("Limiting layout text to {} of {} pages", limit, page_numbers.len());
    }

    let mut collector = GlyphCollector::default();
    for &page in &page_numbers[..limit] {
        pdf_extract::output_doc_page(&doc, &mut collector, page)
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))?;
    }

    Ok(collector
        .pages
        .into_iter()
        .enumerate()
        .map(|(idx, glyphs)| {
            let text = render_layout(glyphs);
            trace!("Page {} layout: {} lines", idx + 1, text.lines().count());
            text
        })
        .collect())
}

/// Typeset glyphs into lines on a character grid.
pub fn render_layout(mut glyphs: Vec<Glyph>) -> String {
    glyphs.retain(|g| !g.text.trim().is_empty());
    if glyphs.is_empty() {
        return String::new();
    }

    let unit = grid_unit(&glyphs);
    glyphs.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<Glyph>> = Vec::new();
    for glyph in glyphs {
        match lines.last_mut() {
            Some(line) if (glyph.y - line[0].y).abs() <= glyph.size.max(line[0].size) * LINE_TOLERANCE => {
                line.push(glyph)
            }
            _ => lines.push(vec![glyph]),
        }
    }

    lines
        .iter_mut()
        .map(|line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            render_line(line, unit)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(line: &[Glyph], unit: f64) -> String {
    let mut out = String::new();
    let mut cursor = 0usize;
    let mut last_end: Option<f64> = None;

    for glyph in line {
        let target = (glyph.x.max(0.0) / unit).round() as usize;
        let column = match last_end {
            None => target,
            Some(end) if glyph.x - end >= glyph.size * CELL_GAP => target.max(cursor + 2),
            Some(end) if glyph.x - end > glyph.size * WORD_GAP => cursor + 1,
            Some(_) => cursor,
        };

        out.extend(std::iter::repeat_n(' ', column.saturating_sub(cursor)));
        cursor = cursor.max(column);
        out.push_str(&glyph.text);
        cursor += glyph.text.chars().count();
        last_end = Some(glyph.end());
    }

    out
}

/// Width of one grid column: the median glyph advance on the page.
fn grid_unit(glyphs: &[Glyph]) -> f64 {
    let mut advances: Vec<f64> = glyphs.iter().map(|g| g.advance).filter(|a| *a > 0.0).collect();
    if advances.is_empty() {
        advances = glyphs.iter().map(|g| g.size * 0.5).filter(|a| *a > 0.0).collect();
    }
    advances.sort_by(f64::total_cmp);
    advances.get(advances.len() / 2).copied().unwrap_or(5.0)
}
