//! Static build logic for snapshell prerendering.
//!
//! Resolves logical asset names against a bundler's emitted asset graph,
//! renders the HTML shell from a template, and rewrites captured markup into
//! a portable static document.

pub mod charset;
pub mod correct;
pub mod graph;
pub mod shell;

pub use charset::CharacterSet;
pub use correct::{correct_markup, CorrectionReport};
pub use graph::{AssetGraph, GraphEntry, GraphError};
pub use shell::{render_template, FontDescriptor, FontSpec, ShellContext, ShellError, ShellOptions};
