//! `studysplit` - split textbook PDFs into topic sections
//!
//! Section boundaries are found from typography alone: lines set in a
//! font size larger than the body text start a new section.
//!
//! ```text
//! PDF ─▶ words ─▶ lines ─▶ font profile ─▶ header sizes ─▶ sections ─▶ JSON
//!                               │                ▲
//!                               └── report ─▶ oracle (optional, validated)
//! ```
//!
//! # Features
//!
//! - **Line assembly**: words merged by vertical proximity ([`layout`])
//! - **Font profiling**: per-size counts, lengths and samples ([`profile`])
//! - **Junk filtering**: margins, page numbers, captions ([`junk`])
//! - **Header classification**: LLM oracle with heuristic fallback ([`classify`])
//! - **Section assembly**: wrapped titles merged, short sections suppressed ([`sections`])
//!
//! # Example
//!
//! ```rust,no_run
//! use studysplit::{export, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pages = export::read_words("chapter1.words.json".as_ref())?;
//!     let outcome = Pipeline::heuristic().run_words(&pages).await;
//!     println!("{} sections", outcome.sections.len());
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod junk;
pub mod layout;
pub mod oracle;
pub mod pipeline;
pub mod profile;
pub mod sections;

pub use classify::{Classification, ClassifierConfig, DecidedBy, HeaderClassifier, HeaderSizeSet, Strategy};
pub use config::Settings;
pub use error::{Error, Result};
pub use junk::{JunkConfig, JunkFilter, Strictness};
pub use layout::{assemble_document, assemble_lines, Line, PageWords, Word};
pub use oracle::{AnthropicOracle, OllamaOracle, OracleBackend, OracleError, OracleReply, OracleRequest, SizeOracle};
pub use pipeline::{Pipeline, PipelineConfig, SplitOutcome, SplitReport};
pub use profile::{FontProfile, FontStats, SizeKey};
pub use sections::{Section, SectionAssembler, SectionConfig};

/// Version of studysplit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
