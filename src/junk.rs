//! Noise line detection.
//!
//! A line is junk when it sits in the running-head or footer band of its
//! page, is a bare page number, or starts with a caption prefix. The check
//! looks at one line only and never at its neighbours, so it is safe to
//! call in any order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Caption prefixes matched case-insensitively against the trimmed text.
pub const DEFAULT_CAPTION_PREFIXES: [&str; 4] = ["figure", "fig.", "table", "box"];

/// Preset margin widths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Top 8% and bottom 10% of the page are margins.
    #[default]
    Standard,
    /// Top 10% and bottom 10% of the page are margins.
    Strict,
}

impl Strictness {
    /// `(header_band, footer_band)` as fractions of page height.
    pub fn bands(self) -> (f32, f32) {
        match self {
            Self::Standard => (0.08, 0.10),
            Self::Strict => (0.10, 0.10),
        }
    }
}

/// Junk filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunkConfig {
    /// Fraction of page height from the top treated as running-head margin.
    pub header_band: f32,
    /// Fraction of page height from the bottom treated as footer margin.
    pub footer_band: f32,
    pub caption_prefixes: Vec<String>,
}

impl Default for JunkConfig {
    fn default() -> Self {
        Self::with_strictness(Strictness::Standard)
    }
}

impl JunkConfig {
    pub fn with_strictness(strictness: Strictness) -> Self {
        let (header_band, footer_band) = strictness.bands();
        Self {
            header_band,
            footer_band,
            caption_prefixes: DEFAULT_CAPTION_PREFIXES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Pure junk predicate built from a [`JunkConfig`].
#[derive(Debug, Clone)]
pub struct JunkFilter {
    header_band: f32,
    footer_band: f32,
    prefixes: Vec<String>,
}

impl Default for JunkFilter {
    fn default() -> Self {
        Self::new(&JunkConfig::default())
    }
}

impl JunkFilter {
    pub fn new(config: &JunkConfig) -> Self {
        Self {
            header_band: config.header_band,
            footer_band: config.footer_band,
            prefixes: config
                .caption_prefixes
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// `true` when the line is a margin artifact, page number, or caption.
    ///
    /// A non-positive `page_height` disables the margin check.
    pub fn is_junk(&self, text: &str, top: f32, page_height: f32) -> bool {
        self.in_margin(top, page_height) || Self::is_page_number(text) || self.is_caption(text)
    }

    fn in_margin(&self, top: f32, page_height: f32) -> bool {
        if page_height <= 0.0 {
            return false;
        }
        top < page_height * self.header_band || top > page_height * (1.0 - self.footer_band)
    }

    fn is_page_number(text: &str) -> bool {
        PAGE_NUMBER.is_match(text.trim())
    }

    fn is_caption(&self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        self.prefixes.iter().any(|p| lowered.starts_with(p.as_str()))
    }
}
