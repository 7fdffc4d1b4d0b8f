//! Files read and written by a run.
//!
//! - sections: pretty JSON array of `{title, content}` in document order
//! - font report: the plain-text report from [`FontProfile::render_report`]
//! - summary: pretty JSON of the run's [`SplitReport`]
//! - words: JSON array of pages as produced by the extraction primitive

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::layout::PageWords;
use crate::pipeline::SplitReport;
use crate::profile::FontProfile;
use crate::sections::Section;

/// Serialize sections to pretty JSON. Non-ASCII text is kept as is.
pub fn sections_json(sections: &[Section]) -> Result<String> {
    Ok(serde_json::to_string_pretty(sections)?)
}

/// Write the sections document, creating parent directories as needed.
pub fn write_sections(path: &Path, sections: &[Section]) -> Result<()> {
    write_text(path, &sections_json(sections)?)?;
    tracing::info!("Wrote {} sections to {}", sections.len(), path.display());
    Ok(())
}

pub fn write_font_report(path: &Path, profile: &FontProfile) -> Result<()> {
    write_text(path, &profile.render_report())?;
    tracing::info!("Wrote font report to {}", path.display());
    Ok(())
}

pub fn write_summary(path: &Path, report: &SplitReport) -> Result<()> {
    write_text(path, &serde_json::to_string_pretty(report)?)?;
    tracing::info!("Wrote run summary to {}", path.display());
    Ok(())
}

/// Read pre-extracted pages. Page indices are reassigned by position.
pub fn read_words(path: &Path) -> Result<Vec<PageWords>> {
    if !path.is_file() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let mut pages: Vec<PageWords> = serde_json::from_str(&content)?;
    for (index, page) in pages.iter_mut().enumerate() {
        page.index = index;
    }
    Ok(pages)
}

pub fn write_words<W: Write>(writer: W, pages: &[PageWords]) -> Result<()> {
    serde_json::to_writer_pretty(writer, pages)?;
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Word;

    #[test]
    fn sections_json_shape() {
        let sections = vec![Section {
            title: "Über".to_string(),
            content: "text\n".to_string(),
            ordinal: 0,
        }];
        let json = sections_json(&sections).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value, serde_json::json!([{"title": "Über", "content": "text\n"}]));
        assert!(json.contains("Über"));
        assert!(json.contains("\n  {"));
    }

    #[test]
    fn empty_sections_is_empty_array() {
        assert_eq!(sections_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = std::env::temp_dir().join("studysplit_export_test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("out.json");

        write_sections(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn summary_creates_parent_dirs() {
        let dir = std::env::temp_dir().join("studysplit_summary_test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("runs").join("summary.json");
        let report = crate::Pipeline::heuristic().run_words(&[]).await.report;

        write_summary(&path, &report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["sections"], 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_words_reindexes_pages() {
        let path = std::env::temp_dir().join("studysplit_read_words.json");
        let json = r#"[
            {"height": 800, "words": [{"text": "a", "size": 11, "top": 100}]},
            {"index": 7, "width": 600, "height": 800, "words": []}
        ]"#;
        fs::write(&path, json).unwrap();

        let pages = read_words(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].words[0], Word::new("a", 11.0, 100.0));
        assert_eq!(pages[1].index, 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn read_words_missing_file() {
        let path = std::env::temp_dir().join("studysplit_no_words.json");
        let _ = fs::remove_file(&path);
        assert!(matches!(read_words(&path), Err(Error::InputNotFound(_))));
    }

    #[test]
    fn read_words_rejects_bad_json() {
        let path = std::env::temp_dir().join("studysplit_bad_words.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_words(&path), Err(Error::Json(_))));
        let _ = fs::remove_file(&path);
    }
}
