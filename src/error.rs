//! Crate-level error type.
//!
//! Only input-side failures surface here. Oracle failures are recovered
//! inside [`crate::classify`] and never reach callers.

use std::path::PathBuf;

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("PDF support not compiled in (enable the `pdf` feature)")]
    PdfSupportDisabled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
