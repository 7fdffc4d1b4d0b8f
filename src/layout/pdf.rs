//! Word extraction from PDF files.
//!
//! Uses `pdfium-render` (Chromium's PDF library) to read positioned
//! characters, then groups them into word boxes carrying the attributes the
//! line assembler needs: text, font size, and `top` in top-down page
//! coordinates.
//!
//! # Pipeline
//!
//! ```text
//! PDF file → pdfium chars → words (gap split) → reading order → PageWords
//! ```

use std::path::Path;

use pdfium_render::prelude::*;

use super::{PageWords, Word};
use crate::error::{Error, Result};

/// Words whose tops differ by less than this share a row when ordering.
const ROW_TOLERANCE: f32 = 3.0;

/// A positioned character extracted from a PDF page.
#[derive(Debug, Clone)]
struct PdfChar {
    ch: char,
    /// Left edge in PDF points.
    x: f32,
    /// Top edge, measured down from the top of the page.
    top: f32,
    width: f32,
    size: f32,
}

/// A word under construction, with its horizontal extent for ordering.
#[derive(Debug, Clone)]
struct WordBox {
    word: Word,
    x: f32,
}

/// Load pdfium, preferring a library next to the binary over the system one.
fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdf(format!("pdfium library not available: {e}")))?;
    Ok(Pdfium::new(bindings))
}

/// Extract word boxes for every page of `path`, in reading order.
pub fn extract_words(path: &Path) -> Result<Vec<PageWords>> {
    if !path.is_file() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let pdfium = bind_pdfium()?;
    let doc = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| Error::Pdf(format!("failed to open {}: {e}", path.display())))?;

    let mut pages = Vec::new();
    for (index, page) in doc.pages().iter().enumerate() {
        let height = page.height().value;
        let width = page.width().value;
        let chars = page_chars(&page, height)?;
        let words = order_words(group_words(&chars));

        tracing::debug!("Page {}: {} chars, {} words", index + 1, chars.len(), words.len());
        pages.push(PageWords {
            index,
            width,
            height,
            words,
        });
    }

    tracing::info!("Extracted {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

#[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
fn page_chars(page: &PdfPage, page_height: f32) -> Result<Vec<PdfChar>> {
    let text = page
        .text()
        .map_err(|e| Error::Pdf(format!("failed to extract text from page: {e}")))?;

    let mut chars = Vec::new();
    for ch in text.chars().iter() {
        if let (Some(unicode_ch), Ok(rect)) = (ch.unicode_char(), ch.tight_bounds()) {
            chars.push(PdfChar {
                ch: unicode_ch,
                x: rect.left.value,
                top: page_height - rect.top.value,
                width: (rect.right.value - rect.left.value).abs(),
                size: ch.scaled_font_size().value,
            });
        }
    }
    Ok(chars)
}

/// Split the character stream into words at whitespace, line jumps, and
/// horizontal gaps wider than 30% of the running average glyph width.
fn group_words(chars: &[PdfChar]) -> Vec<WordBox> {
    let mut words = Vec::new();
    let mut current: Vec<&PdfChar> = Vec::new();

    for ch in chars {
        if ch.ch.is_whitespace() || ch.ch.is_control() {
            flush_word(&mut current, &mut words);
            continue;
        }

        if let Some(last) = current.last() {
            let avg_width =
                current.iter().map(|c| c.width).sum::<f32>() / current.len() as f32;
            let gap = ch.x - (last.x + last.width);
            let jumped = (ch.top - last.top).abs() > last.size.max(ch.size) * 0.5;
            if jumped || gap > avg_width * 0.3 || gap < -avg_width {
                flush_word(&mut current, &mut words);
            }
        }
        current.push(ch);
    }
    flush_word(&mut current, &mut words);

    words
}

fn flush_word(current: &mut Vec<&PdfChar>, words: &mut Vec<WordBox>) {
    if current.is_empty() {
        return;
    }

    let text: String = current.iter().map(|c| c.ch).collect();
    let size = current.iter().map(|c| c.size).fold(0.0_f32, f32::max);
    let top = current.iter().map(|c| c.top).fold(f32::INFINITY, f32::min);
    let x = current[0].x;

    words.push(WordBox {
        word: Word { text, size, top },
        x,
    });
    current.clear();
}

/// Order words top-to-bottom, then left-to-right within rows of similar `top`.
fn order_words(mut boxes: Vec<WordBox>) -> Vec<Word> {
    boxes.sort_by(|a, b| a.word.top.total_cmp(&b.word.top));

    let mut ordered = Vec::with_capacity(boxes.len());
    let mut row: Vec<WordBox> = Vec::new();

    for wb in boxes {
        let same_row = row
            .first()
            .is_some_and(|first| (wb.word.top - first.word.top).abs() < ROW_TOLERANCE);
        if !same_row && !row.is_empty() {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            ordered.extend(row.drain(..).map(|b| b.word));
        }
        row.push(wb);
    }
    row.sort_by(|a, b| a.x.total_cmp(&b.x));
    ordered.extend(row.into_iter().map(|b| b.word));

    ordered
}
