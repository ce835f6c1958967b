//! Shell-only command: render the templates, skip the browser.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::RenderConfig;
use crate::pipeline;

/// Run the shell command.
pub async fn run(config_path: PathBuf, dist: Option<PathBuf>) -> Result<()> {
    let config = RenderConfig::load(&config_path, dist)?;

    pipeline::render_shell(&config)?;
    pipeline::render_headers(&config)?;

    Ok(())
}
