//! End-to-end run over one document.
//!
//! ```text
//! PageWords ─▶ lines ─▶ FontProfile ─▶ HeaderSizeSet ─▶ sections
//!              (all)    (first N pages)  (oracle/heuristic)
//! ```
//!
//! Extraction and line assembly are synchronous. The only await point is
//! the classifier's oracle round trip.

use std::future::Future;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::classify::{Classification, HeaderClassifier, Strategy};
use crate::config::Settings;
use crate::error::Result;
use crate::junk::{JunkConfig, JunkFilter};
use crate::layout::{assemble_lines, Line, PageWords, DEFAULT_LINE_TOLERANCE};
use crate::profile::{FontProfile, DEFAULT_SAMPLE_CAP, DEFAULT_SAMPLE_CHARS};
use crate::sections::{Section, SectionAssembler, SectionConfig};

/// Settings for every stage except classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub line_tolerance: f32,
    pub sample_cap: usize,
    pub sample_chars: usize,
    pub page_limit: Option<usize>,
    pub junk: JunkConfig,
    pub sections: SectionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            sample_cap: DEFAULT_SAMPLE_CAP,
            sample_chars: DEFAULT_SAMPLE_CHARS,
            page_limit: None,
            junk: JunkConfig::default(),
            sections: SectionConfig::default(),
        }
    }
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            line_tolerance: settings.layout.line_tolerance,
            sample_cap: settings.profile.sample_cap,
            sample_chars: settings.profile.sample_chars,
            page_limit: settings.profile.page_limit,
            junk: settings.junk.to_config(),
            sections: settings.sections.clone(),
        }
    }
}

/// Run summary, logged and optionally written next to the output.
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub pages: usize,
    pub lines: usize,
    pub profiled_lines: usize,
    pub junk_lines: usize,
    pub header_lines: usize,
    pub body_lines: usize,
    pub classification: Classification,
    pub sections: usize,
    pub suppressed: usize,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub sections: Vec<Section>,
    pub suppressed: Vec<Section>,
    pub profile: FontProfile,
    pub report: SplitReport,
}

/// Lines of all pages plus the font profile of the first `page_limit`.
pub fn scan_pages(pages: &[PageWords], config: &PipelineConfig) -> (Vec<Line>, FontProfile) {
    let limit = config.page_limit.unwrap_or(usize::MAX);
    let mut lines = Vec::new();
    let mut profile = FontProfile::new(config.sample_cap, config.sample_chars);

    for (position, page) in pages.iter().enumerate() {
        let page_lines = assemble_lines(page, config.line_tolerance);
        if position < limit {
            for line in &page_lines {
                profile.record(line);
            }
        }
        lines.extend(page_lines);
    }

    tracing::debug!(
        "Scanned {} pages into {} lines, {} font sizes",
        pages.len(),
        lines.len(),
        profile.len()
    );
    (lines, profile)
}

/// Words in, sections out.
pub struct Pipeline {
    config: PipelineConfig,
    classifier: HeaderClassifier,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, classifier: HeaderClassifier) -> Self {
        Self { config, classifier }
    }

    /// Heuristic classification with default settings.
    pub fn heuristic() -> Self {
        Self::new(PipelineConfig::default(), HeaderClassifier::heuristic())
    }

    /// Build from settings, connecting the configured oracle.
    ///
    /// An oracle that cannot be constructed (e.g. missing API key) is
    /// logged and replaced by the heuristic.
    pub fn from_settings(settings: &Settings) -> Self {
        let classifier_config = settings
            .oracle
            .classifier_config(settings.sections.size_tolerance);
        let strategy = match settings.oracle.connect() {
            Ok(Some(oracle)) => Strategy::Oracle(oracle),
            Ok(None) => Strategy::Heuristic,
            Err(e) => {
                tracing::warn!("Oracle unavailable ({e}), using heuristic");
                Strategy::Heuristic
            }
        };
        Self::new(
            PipelineConfig::from(settings),
            HeaderClassifier::new(strategy, classifier_config),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run_words(&self, pages: &[PageWords]) -> SplitOutcome {
        self.run_words_until(pages, std::future::pending()).await
    }

    /// Split pre-extracted pages. `cancel` aborts only the oracle round
    /// trip; the run still completes with the heuristic.
    pub async fn run_words_until<F>(&self, pages: &[PageWords], cancel: F) -> SplitOutcome
    where
        F: Future<Output = ()>,
    {
        let (lines, profile) = scan_pages(pages, &self.config);
        let body_size = profile.body_size();
        info!("Body size {body_size:.1} pt across {} font sizes", profile.len());

        let classification = self.classifier.classify_until(&profile, body_size, cancel).await;

        let junk = JunkFilter::new(&self.config.junk);
        let assembly =
            SectionAssembler::new(&classification.sizes, &junk, &self.config.sections).assemble(&lines);

        let report = SplitReport {
            pages: pages.len(),
            lines: lines.len(),
            profiled_lines: profile.iter().map(|(_, stats)| stats.count).sum(),
            junk_lines: assembly.junk_lines,
            header_lines: assembly.header_lines,
            body_lines: assembly.body_lines,
            sections: assembly.sections.len(),
            suppressed: assembly.suppressed.len(),
            classification,
        };

        info!(
            "Split {} pages into {} sections, {} suppressed, header sizes by {:?}",
            report.pages, report.sections, report.suppressed, report.classification.decided_by
        );

        SplitOutcome {
            sections: assembly.sections,
            suppressed: assembly.suppressed,
            profile,
            report,
        }
    }

    /// Extract words from a PDF, then split.
    pub async fn run_pdf<F>(&self, path: &Path, cancel: F) -> Result<SplitOutcome>
    where
        F: Future<Output = ()>,
    {
        let pages = extract_pdf(path)?;
        Ok(self.run_words_until(&pages, cancel).await)
    }
}

/// Word boxes for every page of a PDF.
#[cfg(feature = "pdf")]
pub fn extract_pdf(path: &Path) -> Result<Vec<PageWords>> {
    crate::layout::pdf::extract_words(path)
}

#[cfg(not(feature = "pdf"))]
pub fn extract_pdf(path: &Path) -> Result<Vec<PageWords>> {
    if !path.is_file() {
        return Err(crate::error::Error::InputNotFound(path.to_path_buf()));
    }
    Err(crate::error::Error::PdfSupportDisabled)
}
