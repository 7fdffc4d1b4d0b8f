//! Section assembly.
//!
//! A single pass over the document's lines in order:
//!
//! ```text
//! line ──▶ clean ──▶ junk? ──yes──▶ skip
//!                      │ no
//!                      ▼
//!                   header size? ──no──▶ append to content
//!                      │ yes
//!                      ▼
//!        same size as current title and content still fresh?
//!              │ yes                         │ no
//!              ▼                             ▼
//!     extend title (wrapped title)   close current, open new
//! ```
//!
//! A closed section is kept only when its content is longer than
//! `min_content_chars`. The final section is closed by the same rule.
//! Dropped candidates that had content are reported as suppressed, so no
//! body text disappears silently.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::HeaderSizeSet;
use crate::junk::JunkFilter;
use crate::layout::{clean_text, Line};
use crate::profile::SizeKey;

/// One titled span of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    /// Newline-terminated body lines.
    pub content: String,
    /// Position among all closed candidates, retained or suppressed.
    #[serde(skip)]
    pub ordinal: usize,
}

impl Section {
    /// Content length in characters.
    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// Section assembler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Maximum size difference for a line to match a header size.
    pub size_tolerance: f32,
    /// Sections need strictly more content characters than this.
    pub min_content_chars: usize,
    /// A same-size header line extends the current title while the current
    /// content is shorter than this.
    pub merge_max_content: usize,
    /// Title of the section opened before the first header.
    pub default_title: String,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            size_tolerance: crate::classify::DEFAULT_SIZE_TOLERANCE,
            min_content_chars: 50,
            merge_max_content: 10,
            default_title: "Introduction".to_string(),
        }
    }
}

/// Result of one assembly pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionAssembly {
    /// Retained sections in document order.
    pub sections: Vec<Section>,
    /// Candidates with content too short to keep, in document order.
    pub suppressed: Vec<Section>,
    pub junk_lines: usize,
    pub header_lines: usize,
    pub body_lines: usize,
}

/// In-progress section.
struct Draft {
    title: String,
    content: String,
    content_chars: usize,
    header: Option<SizeKey>,
}

impl Draft {
    fn new(title: String, header: Option<SizeKey>) -> Self {
        Self {
            title,
            content: String::new(),
            content_chars: 0,
            header,
        }
    }
}

/// Splits a line sequence into sections at header-sized lines.
pub struct SectionAssembler<'a> {
    headers: &'a HeaderSizeSet,
    junk: &'a JunkFilter,
    config: &'a SectionConfig,
}

impl<'a> SectionAssembler<'a> {
    pub fn new(headers: &'a HeaderSizeSet, junk: &'a JunkFilter, config: &'a SectionConfig) -> Self {
        Self { headers, junk, config }
    }

    /// Walk `lines` in order. Never fails; with no header sizes the whole
    /// document lands in the default section.
    pub fn assemble(&self, lines: &[Line]) -> SectionAssembly {
        let mut out = SectionAssembly::default();
        let mut ordinal = 0;
        let mut draft = Draft::new(self.config.default_title.clone(), None);

        for line in lines {
            let text = clean_text(&line.text);
            if text.is_empty() || self.junk.is_junk(&text, line.top, line.page_height) {
                out.junk_lines += 1;
                continue;
            }

            let size = line.size_key();
            if !self.headers.matches(size, self.config.size_tolerance) {
                out.body_lines += 1;
                draft.content_chars += text.chars().count() + 1;
                draft.content.push_str(&text);
                draft.content.push('\n');
                continue;
            }

            out.header_lines += 1;
            let continues_title = draft
                .header
                .is_some_and(|h| h.within(size, self.config.size_tolerance))
                && draft.content_chars < self.config.merge_max_content;

            if continues_title {
                debug!("Title continues on page {}: {text:?}", line.page);
                draft.title.push(' ');
                draft.title.push_str(&text);
            } else {
                debug!("Header at size {size} on page {}: {text:?}", line.page);
                let previous = std::mem::replace(&mut draft, Draft::new(text, Some(size)));
                self.close(previous, &mut ordinal, &mut out);
            }
        }
        self.close(draft, &mut ordinal, &mut out);

        info!(
            "Assembled {} sections ({} suppressed, {} junk lines)",
            out.sections.len(),
            out.suppressed.len(),
            out.junk_lines
        );
        out
    }

    fn close(&self, draft: Draft, ordinal: &mut usize, out: &mut SectionAssembly) {
        if draft.content.is_empty() {
            debug!("Dropping empty section {:?}", draft.title);
            return;
        }

        let keep = draft.content_chars > self.config.min_content_chars;
        let section = Section {
            title: draft.title,
            content: draft.content,
            ordinal: *ordinal,
        };
        *ordinal += 1;

        if keep {
            out.sections.push(section);
        } else {
            debug!(
                "Suppressing {:?}: {} content chars",
                section.title,
                section.content_chars()
            );
            out.suppressed.push(section);
        }
    }
}
