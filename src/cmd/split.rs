use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::oneshot;

use studysplit::{export, Pipeline, Settings};

use super::load_pages;
use crate::InputArgs;

/// Optional artifact paths for `split`.
pub struct SplitOutputs {
    pub output: Option<PathBuf>,
    pub font_report: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// `<input>.topics.json` next to the input.
fn default_output(input: &Path) -> PathBuf {
    input.with_extension("topics.json")
}

/// Exit status after Ctrl-C.
const INTERRUPTED_EXIT: i32 = 130;

/// Watch for Ctrl-C for the rest of the process.
///
/// The first signal during the oracle phase cancels the oracle through the
/// returned receiver. A signal after that phase (receiver dropped) or a
/// second signal exits the process.
fn watch_interrupts() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        if tx.send(()).is_err() {
            std::process::exit(INTERRUPTED_EXIT);
        }
        tracing::warn!("Interrupted, abandoning oracle");
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(INTERRUPTED_EXIT);
        }
    });
    rx
}

/// Resolves when the watcher fires. Never resolves if the watcher is gone.
async fn cancelled(rx: oneshot::Receiver<()>) {
    if rx.await.is_err() {
        std::future::pending::<()>().await;
    }
}

pub async fn cmd_split(settings: &Settings, input: &InputArgs, outputs: &SplitOutputs) -> Result<()> {
    let (source, pages) = load_pages(input)?;
    let output = outputs.output.clone().unwrap_or_else(|| default_output(&source));

    let pipeline = Pipeline::from_settings(settings);
    let outcome = pipeline.run_words_until(&pages, cancelled(watch_interrupts())).await;

    export::write_sections(&output, &outcome.sections)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if let Some(path) = &outputs.font_report {
        export::write_font_report(path, &outcome.profile)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(path) = &outputs.summary {
        export::write_summary(path, &outcome.report)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let report = &outcome.report;
    println!(
        "📏 Body size {:.1} pt, header sizes {:?} ({:?})",
        report.classification.body_size,
        report.classification.sizes.points(),
        report.classification.decided_by
    );
    if let Some(reason) = &report.classification.fallback_reason {
        println!("⚠️  Oracle fallback: {reason}");
    }
    println!(
        "✂️  {} sections from {} pages ({} suppressed, {} junk lines)",
        report.sections, report.pages, report.suppressed, report.junk_lines
    );
    for section in outcome.sections.iter().take(5) {
        println!("   📌 {}", section.title);
    }
    println!("💾 Saved to {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            default_output(Path::new("books/ch1.pdf")),
            PathBuf::from("books/ch1.topics.json")
        );
    }

    #[tokio::test]
    async fn cancelled_resolves_on_signal() {
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), cancelled(rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_pends_without_watcher() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        let waited = tokio::time::timeout(std::time::Duration::from_millis(50), cancelled(rx)).await;
        assert!(waited.is_err());
    }
}
