use std::path::Path;

use anyhow::{Context, Result};

use studysplit::export;

pub fn cmd_words(input: &Path) -> Result<()> {
    let pages = studysplit::pipeline::extract_pdf(input)
        .with_context(|| format!("failed to extract words from {}", input.display()))?;
    let words: usize = pages.iter().map(|p| p.words.len()).sum();
    tracing::info!("Extracted {words} words from {} pages", pages.len());

    let stdout = std::io::stdout();
    export::write_words(stdout.lock(), &pages)?;
    println!();
    Ok(())
}
