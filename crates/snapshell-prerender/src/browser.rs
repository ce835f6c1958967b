//! Chromium-backed page capture over the DevTools protocol.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;

// A plain DOM serialization omits values set only through user or script
// interaction; copying them into the attribute makes the snapshot
// self-describing.
const NORMALIZE_INPUT_VALUES: &str =
    r#"document.querySelectorAll("input").forEach((el) => el.setAttribute("value", el.value))"#;

const OUTER_HTML: &str = "document.documentElement.outerHTML";

/// Errors that can occur capturing a page.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Failed to decode evaluation result: {0}")]
    Evaluate(#[from] serde_json::Error),
}

/// Captures the rendered DOM of a page at a URL.
///
/// One implementation drives a real browser; tests substitute a fake so the
/// rest of the pipeline runs without Chrome installed.
pub trait PageCapturer {
    fn capture(&self, url: &str) -> impl Future<Output = Result<String, CaptureError>>;
}

/// Headless Chromium capturer: one browser process, one page, one
/// navigation per call.
#[derive(Debug, Clone)]
pub struct ChromiumCapturer {
    /// Deterministic rendering surface, width by height.
    pub viewport: (u32, u32),
    /// Fixed wait after navigation settles, for post-load rendering work
    /// that does not signal completion through the navigation event.
    pub settle: Duration,
}

impl Default for ChromiumCapturer {
    fn default() -> Self {
        Self {
            viewport: (1280, 720),
            settle: Duration::from_secs(1),
        }
    }
}

impl ChromiumCapturer {
    pub fn new(viewport: (u32, u32), settle: Duration) -> Self {
        Self { viewport, settle }
    }

    async fn capture_page(&self, browser: &Browser, url: &str) -> Result<String, CaptureError> {
        let page = browser.new_page("about:blank").await?;

        tracing::debug!("Navigating to {}", url);
        page.goto(url).await?;
        page.wait_for_navigation().await?;

        tokio::time::sleep(self.settle).await;

        page.evaluate(NORMALIZE_INPUT_VALUES).await?;
        let markup: String = page.evaluate(OUTER_HTML).await?.into_value()?;

        Ok(with_doctype(&markup))
    }
}

impl PageCapturer for ChromiumCapturer {
    async fn capture(&self, url: &str) -> Result<String, CaptureError> {
        let (width, height) = self.viewport;
        let config = BrowserConfig::builder()
            .viewport(Viewport {
                width,
                height,
                ..Viewport::default()
            })
            .build()
            .map_err(CaptureError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.capture_page(&browser, url).await;

        // Close on every path; a failed navigation must not leak the
        // browser process.
        if let Err(e) = browser.close().await {
            tracing::debug!("Browser close failed: {}", e);
        }
        let _ = browser.wait().await;
        driver.abort();

        result
    }
}

/// Prefix serialized markup with the standard document-type declaration,
/// which `outerHTML` does not carry.
pub fn with_doctype(markup: &str) -> String {
    format!("<!doctype html>{markup}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctype_is_prepended() {
        assert_eq!(
            with_doctype("<html><body></body></html>"),
            "<!doctype html><html><body></body></html>"
        );
    }

    #[test]
    fn normalization_script_copies_live_values_into_attributes() {
        assert!(NORMALIZE_INPUT_VALUES.contains(r#"setAttribute("value", el.value)"#));
        assert!(NORMALIZE_INPUT_VALUES.contains(r#"querySelectorAll("input")"#));
    }

    #[test]
    fn default_capturer_uses_fixed_viewport_and_settle() {
        let capturer = ChromiumCapturer::default();
        assert_eq!(capturer.viewport, (1280, 720));
        assert_eq!(capturer.settle, Duration::from_secs(1));
    }
}
