//! Per-font-size line statistics.
//!
//! Every line is bucketed by its size rounded to one decimal. Each bucket
//! tracks how many lines it holds, their total character length, and the
//! first few texts seen as evidence for the header classifier. The most
//! frequent bucket is the body size.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use crate::layout::SizeKey;
use crate::layout::{clean_text, Line};

/// Body size reported for a document with no lines.
pub const FALLBACK_BODY_SIZE: f32 = 12.0;

/// Default number of sample texts kept per size.
pub const DEFAULT_SAMPLE_CAP: usize = 5;

/// Default preview length (characters) of a sample text.
pub const DEFAULT_SAMPLE_CHARS: usize = 100;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Running statistics for one size bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontStats {
    pub count: usize,
    pub total_chars: usize,
    pub samples: Vec<String>,
}

impl FontStats {
    /// Average line length in characters, truncated.
    pub fn average_chars(&self) -> usize {
        self.total_chars.checked_div(self.count).unwrap_or(0)
    }
}

/// Aggregate of line statistics keyed by rounded size.
///
/// Built by [`FontProfile::record`] during the scan and read-only
/// afterwards. Partial profiles from separately scanned page ranges can be
/// combined with [`FontProfile::merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct FontProfile {
    entries: BTreeMap<SizeKey, FontStats>,
    sample_cap: usize,
    sample_chars: usize,
}

impl Default for FontProfile {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAP, DEFAULT_SAMPLE_CHARS)
    }
}

impl FontProfile {
    pub fn new(sample_cap: usize, sample_chars: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            sample_cap,
            sample_chars,
        }
    }

    /// Build a profile from a sequence of lines.
    pub fn from_lines<'a>(
        lines: impl IntoIterator<Item = &'a Line>,
        sample_cap: usize,
        sample_chars: usize,
    ) -> Self {
        let mut profile = Self::new(sample_cap, sample_chars);
        for line in lines {
            profile.record(line);
        }
        profile
    }

    /// Account one line.
    pub fn record(&mut self, line: &Line) {
        let stats = self.entries.entry(line.size_key()).or_default();
        stats.count += 1;
        stats.total_chars += line.text.chars().count();

        if stats.samples.len() < self.sample_cap {
            let collapsed = WHITESPACE_RUN.replace_all(&clean_text(&line.text), " ").into_owned();
            stats.samples.push(collapsed.chars().take(self.sample_chars).collect());
        }
    }

    /// Fold another partial profile into this one. Samples from `self` take
    /// precedence, so merging page ranges in document order keeps the
    /// first-seen samples.
    pub fn merge(&mut self, other: FontProfile) {
        for (key, theirs) in other.entries {
            let ours = self.entries.entry(key).or_default();
            ours.count += theirs.count;
            ours.total_chars += theirs.total_chars;
            let room = self.sample_cap.saturating_sub(ours.samples.len());
            ours.samples.extend(theirs.samples.into_iter().take(room));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: SizeKey) -> Option<&FontStats> {
        self.entries.get(&key)
    }

    /// Entries in ascending size order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (SizeKey, &FontStats)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// The most frequent size. On equal counts the larger size wins, so a
    /// rarer large font cannot hide behind a tied smaller candidate when
    /// header sizes are later required to be strictly above body size.
    ///
    /// Returns `None` for an empty profile.
    pub fn body_key(&self) -> Option<SizeKey> {
        self.entries
            .iter()
            .max_by(|(ka, a), (kb, b)| a.count.cmp(&b.count).then(ka.cmp(kb)))
            .map(|(k, _)| *k)
    }

    /// Body size in points, or [`FALLBACK_BODY_SIZE`] when empty.
    pub fn body_size(&self) -> f32 {
        self.body_key().map_or(FALLBACK_BODY_SIZE, SizeKey::points)
    }

    /// Nearest size present in the profile within `tolerance` of `points`.
    pub fn nearest_key(&self, points: f32, tolerance: f32) -> Option<SizeKey> {
        let probe = SizeKey::from_points(points);
        self.entries
            .keys()
            .copied()
            .filter(|k| k.within(probe, tolerance))
            .min_by(|a, b| a.distance(probe).total_cmp(&b.distance(probe)))
    }

    /// Human-readable font report, largest size first.
    ///
    /// This is both the oracle's evidence and the debug report artifact.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        let Some(body) = self.body_key() else {
            out.push_str("NO TEXT LINES FOUND\n");
            return out;
        };

        // Writing to a String cannot fail.
        let _ = writeln!(out, "DETECTED BODY TEXT SIZE: {body} pt");
        let _ = writeln!(out, "{}", "-".repeat(80));

        for (size, stats) in self.entries.iter().rev() {
            let tag = match size.cmp(&body) {
                std::cmp::Ordering::Equal => " [BODY]",
                std::cmp::Ordering::Greater => " [HEADER?]",
                std::cmp::Ordering::Less => " [SMALL]",
            };
            let _ = writeln!(out, "SIZE {:<6}{tag}", size.to_string());
            let _ = writeln!(out, "  • Occurrences: {}", stats.count);
            let _ = writeln!(out, "  • Avg Length:  {} chars", stats.average_chars());
            let _ = writeln!(out, "  • Samples:");
            for sample in &stats.samples {
                let _ = writeln!(out, "      - \"{sample}\"");
            }
            let _ = writeln!(out, "{}", "-".repeat(40));
        }

        out
    }
}
