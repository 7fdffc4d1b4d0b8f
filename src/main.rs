//! `studysplit` CLI - split a textbook PDF into topic sections

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use studysplit::{OracleBackend, Settings, Strictness};

mod cmd;

#[derive(Parser)]
#[command(name = "studysplit")]
#[command(about = "Split textbook PDFs into study topics by header font size")]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.config/studysplit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// PDF path or pre-extracted words file.
#[derive(Args, Clone)]
pub struct InputArgs {
    /// PDF to read
    #[arg(required_unless_present = "words", conflicts_with = "words")]
    pub input: Option<PathBuf>,

    /// Pre-extracted words JSON instead of a PDF
    #[arg(long, value_name = "FILE")]
    pub words: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OracleArg {
    None,
    Ollama,
    Anthropic,
}

impl From<OracleArg> for OracleBackend {
    fn from(arg: OracleArg) -> Self {
        match arg {
            OracleArg::None => Self::None,
            OracleArg::Ollama => Self::Ollama,
            OracleArg::Anthropic => Self::Anthropic,
        }
    }
}

/// `split` flags that override the settings file.
#[derive(Args, Clone, Default)]
struct SplitTuning {
    /// Header size oracle
    #[arg(long, value_enum)]
    oracle: Option<OracleArg>,

    /// Oracle model name
    #[arg(long)]
    model: Option<String>,

    /// Oracle timeout per attempt, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Treat the top 10% of each page as margin
    #[arg(long)]
    strict_margins: bool,

    /// Minimum content characters for a section to be kept
    #[arg(long, value_name = "N")]
    min_content: Option<usize>,

    /// Build the font profile from the first N pages only
    #[arg(long, value_name = "N")]
    page_limit: Option<usize>,
}

impl SplitTuning {
    fn apply(self, settings: &mut Settings) {
        if let Some(oracle) = self.oracle {
            settings.oracle.backend = oracle.into();
        }
        if self.model.is_some() {
            settings.oracle.model = self.model;
        }
        if let Some(secs) = self.timeout {
            settings.oracle.timeout_secs = secs;
        }
        if self.strict_margins {
            settings.junk.strictness = Strictness::Strict;
            settings.junk.header_band = None;
        }
        if let Some(n) = self.min_content {
            settings.sections.min_content_chars = n;
        }
        if self.page_limit.is_some() {
            settings.profile.page_limit = self.page_limit;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Split a document into sections and write them as JSON
    Split {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: <input>.topics.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the font report here
        #[arg(long, value_name = "PATH")]
        font_report: Option<PathBuf>,

        /// Also write the run summary JSON here
        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,

        #[command(flatten)]
        tuning: SplitTuning,
    },

    /// Print the font report
    Fonts {
        #[command(flatten)]
        input: InputArgs,

        /// Build the font profile from the first N pages only
        #[arg(long, value_name = "N")]
        page_limit: Option<usize>,
    },

    /// Dump extracted words of a PDF as JSON (input for `split --words`)
    Words {
        /// PDF to read
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Split {
            input,
            output,
            font_report,
            summary,
            tuning,
        } => {
            tuning.apply(&mut settings);
            let outputs = cmd::SplitOutputs {
                output,
                font_report,
                summary,
            };
            cmd::cmd_split(&settings, &input, &outputs).await?;
        }
        Commands::Fonts { input, page_limit } => {
            if page_limit.is_some() {
                settings.profile.page_limit = page_limit;
            }
            cmd::cmd_fonts(&settings, &input)?;
        }
        Commands::Words { input } => {
            cmd::cmd_words(&input)?;
        }
    }

    Ok(())
}
