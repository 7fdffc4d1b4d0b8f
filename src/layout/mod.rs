//! Word boxes and line reconstruction.
//!
//! The extraction primitive yields, per page, words in reading order
//! (top-to-bottom, left-to-right). Lines are rebuilt in a single pass:
//! a word whose `top` lies within `tolerance` of the previous word's
//! `top` joins the current line, anything else starts a new one.
//!
//! ```text
//! PageWords → assemble_lines → Vec<Line> (per page) → assemble_document
//! ```

#[cfg(feature = "pdf")]
pub mod pdf;

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default vertical proximity (layout units) for two words to share a line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 5.0;

static GLYPH_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(cid:\d+\)").unwrap());

/// A font size rounded to one decimal, stored in tenths of a point so it
/// orders and hashes exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeKey(pub u32);

impl SizeKey {
    /// Round `points` half away from zero to one decimal.
    pub fn from_points(points: f32) -> Self {
        if !points.is_finite() || points <= 0.0 {
            return Self(0);
        }
        Self((points * 10.0).round() as u32)
    }

    pub fn points(self) -> f32 {
        self.0 as f32 / 10.0
    }

    /// Absolute difference in points.
    pub fn distance(self, other: Self) -> f32 {
        self.0.abs_diff(other.0) as f32 / 10.0
    }

    /// `|self - other| < tolerance`, evaluated on the rounded values.
    pub fn within(self, other: Self, tolerance: f32) -> bool {
        self.distance(other) < tolerance
    }
}

impl fmt::Display for SizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.points())
    }
}

/// Strip `(cid:N)` placeholders left by unmapped glyphs and trim.
pub fn clean_text(text: &str) -> String {
    GLYPH_PLACEHOLDER.replace_all(text, "").trim().to_string()
}

/// A positioned word as produced by the extraction primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    /// Font size in points.
    pub size: f32,
    /// Distance from the top edge of the page (top-down coordinates).
    pub top: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, size: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            size,
            top,
        }
    }
}

/// All words of one page, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageWords {
    /// Page index (0-based).
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
}

/// A visual line rebuilt from vertically adjacent words.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub words: Vec<Word>,
    /// Space-joined word text.
    pub text: String,
    /// Largest word size in the line. A single enlarged initial marks the
    /// whole line with its size.
    pub size: f32,
    /// `top` of the first word.
    pub top: f32,
    pub page_height: f32,
    pub page: usize,
}

impl Line {
    fn from_words(words: Vec<Word>, page: &PageWords) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let size = words.iter().map(|w| w.size).fold(0.0_f32, f32::max);
        let top = words.first().map_or(0.0, |w| w.top);

        Self {
            words,
            text,
            size,
            top,
            page_height: page.height,
            page: page.index,
        }
    }

    /// Size rounded to one decimal, the key used for profiling and matching.
    pub fn size_key(&self) -> SizeKey {
        SizeKey::from_points(self.size)
    }
}

/// Group one page's words into lines.
///
/// An empty page yields no lines.
pub fn assemble_lines(page: &PageWords, tolerance: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<Word> = Vec::new();

    for word in &page.words {
        let joins = current
            .last()
            .is_some_and(|last| (word.top - last.top).abs() < tolerance);

        if !joins && !current.is_empty() {
            lines.push(Line::from_words(std::mem::take(&mut current), page));
        }
        current.push(word.clone());
    }

    if !current.is_empty() {
        lines.push(Line::from_words(current, page));
    }

    lines
}

/// Assemble every page and flatten into one document-ordered sequence.
///
/// Pages are visited in the order given; lines never span pages.
pub fn assemble_document(pages: &[PageWords], tolerance: f32) -> Vec<Line> {
    let lines: Vec<Line> = pages
        .iter()
        .flat_map(|page| assemble_lines(page, tolerance))
        .collect();

    tracing::debug!("Assembled {} lines from {} pages", lines.len(), pages.len());
    lines
}
