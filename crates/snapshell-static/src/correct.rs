//! Markup correction.
//!
//! Rewrites the captured DOM snapshot into a portable static document:
//! absolute local-server references become relative, and script side-effects
//! that already ran during capture are stripped so they cannot re-trigger on
//! static load.

use std::sync::LazyLock;

use regex::Regex;

// Chunk-loader tags are injected dynamically while the page executes; in the
// static document the modules are already applied.
static CHUNK_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<script src="\./chunk-[^"]+"[^>]*></script>"#).expect("valid chunk script pattern")
});

// Matches `<ident>.styleInject("...");` with either quote style, any
// identifier. The injected styles are part of the captured markup already.
static STYLE_INJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\w+\.styleInject\(("[^"]*"|'[^']*')\);"#).expect("valid styleInject pattern")
});

/// How many occurrences each rewrite pass matched.
///
/// A pass that matches nothing when at least one occurrence was structurally
/// expected usually means a port mismatch or a changed markup shape
/// upstream; callers surface that as a warning rather than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionReport {
    /// Absolute `http://localhost:<port>/` references rewritten to `./`.
    pub relative_rewrites: usize,
    /// Dynamically injected chunk-loader script tags removed.
    pub chunk_scripts_removed: usize,
    /// Redundant `styleInject` statements removed.
    pub style_injects_removed: usize,
}

impl CorrectionReport {
    /// True when the port-based rewrite found no absolute references at all.
    pub fn rewrote_nothing(&self) -> bool {
        self.relative_rewrites == 0
    }
}

/// Rewrite captured markup into a portable static document.
///
/// Three passes, in order: relativize absolute references against the exact
/// port used for this run, drop chunk-loader script tags, drop
/// `styleInject` calls. Pure; the input is never mutated.
pub fn correct_markup(markup: &str, port: u16) -> (String, CorrectionReport) {
    let mut report = CorrectionReport::default();

    let origin = format!("http://localhost:{port}/");
    report.relative_rewrites = markup.matches(&origin).count();
    let markup = markup.replace(&origin, "./");

    report.chunk_scripts_removed = CHUNK_SCRIPT.find_iter(&markup).count();
    let markup = CHUNK_SCRIPT.replace_all(&markup, "");

    report.style_injects_removed = STYLE_INJECT.find_iter(&markup).count();
    let markup = STYLE_INJECT.replace_all(&markup, "");

    (markup.into_owned(), report)
}
