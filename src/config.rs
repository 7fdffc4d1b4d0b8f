//! Settings loaded from `~/.config/studysplit/config.toml`.
//!
//! Every table and key is optional; missing values take the defaults
//! below.
//!
//! ```toml
//! [layout]
//! line_tolerance = 5.0
//!
//! [profile]
//! sample_cap = 5
//! sample_chars = 100
//! page_limit = 20
//!
//! [junk]
//! strictness = "standard"   # or "strict"
//! caption_prefixes = ["figure", "fig.", "table", "box"]
//!
//! [sections]
//! min_content_chars = 50
//!
//! [oracle]
//! backend = "ollama"        # "none" | "ollama" | "anthropic"
//! model = "qwen2.5:14b"
//! timeout_secs = 60
//! retries = 1
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::ClassifierConfig;
use crate::error::{Error, Result};
use crate::junk::{JunkConfig, Strictness, DEFAULT_CAPTION_PREFIXES};
use crate::layout::DEFAULT_LINE_TOLERANCE;
use crate::oracle::{AnthropicOracle, OllamaOracle, OracleBackend, OracleError, SizeOracle};
use crate::profile::{DEFAULT_SAMPLE_CAP, DEFAULT_SAMPLE_CHARS};
use crate::sections::SectionConfig;

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutSettings,
    pub profile: ProfileSettings,
    pub junk: JunkSettings,
    pub sections: SectionConfig,
    pub oracle: OracleSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub line_tolerance: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub sample_cap: usize,
    pub sample_chars: usize,
    /// Only the first N pages feed the font profile. All pages are still
    /// split into sections.
    pub page_limit: Option<usize>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            sample_chars: DEFAULT_SAMPLE_CHARS,
            page_limit: None,
        }
    }
}

/// Margin bands start from the `strictness` preset; explicit bands win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunkSettings {
    pub strictness: Strictness,
    pub header_band: Option<f32>,
    pub footer_band: Option<f32>,
    pub caption_prefixes: Vec<String>,
}

impl Default for JunkSettings {
    fn default() -> Self {
        Self {
            strictness: Strictness::Standard,
            header_band: None,
            footer_band: None,
            caption_prefixes: DEFAULT_CAPTION_PREFIXES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl JunkSettings {
    pub fn to_config(&self) -> JunkConfig {
        let (header_band, footer_band) = self.strictness.bands();
        JunkConfig {
            header_band: self.header_band.unwrap_or(header_band),
            footer_band: self.footer_band.unwrap_or(footer_band),
            caption_prefixes: self.caption_prefixes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub backend: OracleBackend,
    /// Backend model name; each backend has its own default.
    pub model: Option<String>,
    /// Ollama base URL or Anthropic endpoint override.
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub retries: u32,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            backend: OracleBackend::None,
            model: None,
            url: None,
            timeout_secs: 60,
            retries: 1,
        }
    }
}

impl OracleSettings {
    /// Construct the configured backend. `None` means heuristic only.
    pub fn connect(&self) -> std::result::Result<Option<Box<dyn SizeOracle>>, OracleError> {
        let oracle: Box<dyn SizeOracle> = match self.backend {
            OracleBackend::None => return Ok(None),
            OracleBackend::Ollama => Box::new(OllamaOracle::new(self.url.clone(), self.model.clone())?),
            OracleBackend::Anthropic => {
                let oracle = AnthropicOracle::new(None, self.model.clone())?;
                match &self.url {
                    Some(url) => Box::new(oracle.with_endpoint(url.clone())),
                    None => Box::new(oracle),
                }
            }
        };
        Ok(Some(oracle))
    }

    pub fn classifier_config(&self, size_tolerance: f32) -> ClassifierConfig {
        ClassifierConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
            size_tolerance,
        }
    }
}

impl Settings {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from `path` when given, otherwise from [`default_path`].
    ///
    /// A missing default file yields defaults. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) if !p.is_file() => {
                return Err(Error::Config(format!("config file not found: {}", p.display())));
            }
            Some(p) => p.to_path_buf(),
            None => {
                let p = default_path();
                if !p.is_file() {
                    tracing::debug!("No config at {}, using defaults", p.display());
                    return Ok(Self::default());
                }
                p
            }
        };

        let content = std::fs::read_to_string(&path)?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid TOML in {}: {e}", path.display())))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }
}

/// Return the path to the default config file.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studysplit")
        .join("config.toml")
}
