mod fonts;
mod words;
mod split;

pub use fonts::cmd_fonts;
pub use words::cmd_words;
pub use split::{cmd_split, SplitOutputs};

use std::path::PathBuf;

use anyhow::{Context, Result};

use studysplit::PageWords;

use crate::InputArgs;

/// Read pages from `--words` JSON or extract them from the PDF.
fn load_pages(input: &InputArgs) -> Result<(PathBuf, Vec<PageWords>)> {
    if let Some(words) = &input.words {
        let pages = studysplit::export::read_words(words)
            .with_context(|| format!("failed to read words from {}", words.display()))?;
        return Ok((words.clone(), pages));
    }

    let pdf = input.input.clone().context("no input given")?;
    let pages = studysplit::pipeline::extract_pdf(&pdf)
        .with_context(|| format!("failed to extract words from {}", pdf.display()))?;
    Ok((pdf, pages))
}
