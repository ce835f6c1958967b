//! Pipeline orchestration.
//!
//! Strictly sequential: render shell, start server, capture, correct,
//! persist, stop server, render headers. The server is stopped on the error
//! path too; teardown order is the reverse of acquisition.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use snapshell_prerender::PageCapturer;
use snapshell_static::{correct_markup, render_template, AssetGraph, CorrectionReport, ShellContext};

use crate::config::RenderConfig;

/// What one pipeline run did.
#[derive(Debug)]
pub struct PipelineReport {
    /// Port the ephemeral server was bound to.
    pub port: u16,
    /// Match counts of the correction passes.
    pub correction: CorrectionReport,
}

/// Load the asset graph and render the shell to `<dist>/index.html`.
pub fn render_shell(config: &RenderConfig) -> Result<()> {
    let graph = AssetGraph::from_json_file(&config.graph_path).with_context(|| {
        format!("Failed to load asset graph from {}", config.graph_path.display())
    })?;

    let context = ShellContext::build(&graph, &config.shell)?;
    render_template(&config.shell_template, &config.index_path(), &context)?;

    tracing::info!("Rendered shell to {}", config.index_path().display());

    Ok(())
}

/// Render the response-headers artifact. Independent of prerendering.
pub fn render_headers(config: &RenderConfig) -> Result<()> {
    let empty = BTreeMap::<String, String>::new();
    render_template(&config.headers_template, &config.headers_path(), &empty)?;

    tracing::info!("Rendered headers to {}", config.headers_path().display());

    Ok(())
}

/// Run the full pipeline with the given capturer.
pub async fn run<C: PageCapturer>(config: &RenderConfig, capturer: &C) -> Result<PipelineReport> {
    render_shell(config)?;

    let server = snapshell_server::start(&config.dist_dir).await?;
    let port = server.port();

    // The query parameter tells the page to reach a deterministic rendered
    // state (skip animations, no interaction required).
    let url = format!("http://localhost:{port}/?prerender");
    tracing::info!("Capturing {}", url);

    let outcome = match capturer.capture(&url).await {
        Ok(captured) => {
            let (markup, correction) = correct_markup(&captured, port);
            if correction.rewrote_nothing() {
                tracing::warn!(
                    "No http://localhost:{port}/ references found in captured markup; \
                     the page shape may have changed upstream"
                );
            }
            fs::write(config.index_path(), markup)
                .with_context(|| format!("Failed to write {}", config.index_path().display()))
                .map(|_| correction)
        }
        Err(e) => Err(anyhow::Error::new(e).context("Page capture failed")),
    };

    // The capturer has already closed the browser by the time its error
    // surfaces; the server comes down next regardless of the outcome.
    server.stop().await?;
    let correction = outcome?;

    render_headers(config)?;

    Ok(PipelineReport { port, correction })
}
