use anyhow::Result;

use studysplit::pipeline::{scan_pages, PipelineConfig};
use studysplit::Settings;

use super::load_pages;
use crate::InputArgs;

pub fn cmd_fonts(settings: &Settings, input: &InputArgs) -> Result<()> {
    let (_, pages) = load_pages(input)?;
    let (_, profile) = scan_pages(&pages, &PipelineConfig::from(settings));
    print!("{}", profile.render_report());
    Ok(())
}
