//! Headless browser page capture.
//!
//! Drives one browser instance through one navigation and returns the fully
//! rendered DOM as a markup string. Browser internals stay behind the
//! [`PageCapturer`] trait so the pipeline can be exercised without Chrome.

pub mod browser;

pub use browser::{with_doctype, CaptureError, ChromiumCapturer, PageCapturer};
