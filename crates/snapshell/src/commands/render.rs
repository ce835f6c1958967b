//! Full pipeline command.

use std::path::PathBuf;

use anyhow::Result;
use snapshell_prerender::ChromiumCapturer;

use crate::config::RenderConfig;
use crate::pipeline;

/// Run the render command.
pub async fn run(config_path: PathBuf, dist: Option<PathBuf>) -> Result<()> {
    let config = RenderConfig::load(&config_path, dist)?;

    let capturer = ChromiumCapturer::new(config.viewport, config.settle);
    let report = pipeline::run(&config, &capturer).await?;

    tracing::info!(
        "Prerendered {} (port {}): {} references relativized, {} chunk scripts and {} style injects removed",
        config.index_path().display(),
        report.port,
        report.correction.relative_rewrites,
        report.correction.chunk_scripts_removed,
        report.correction.style_injects_removed,
    );

    Ok(())
}
