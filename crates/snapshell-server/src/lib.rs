//! Ephemeral static file server.
//!
//! Serves a built output directory on an OS-assigned port for the duration
//! of one prerender run. Never exposed externally; only the local browser
//! process connects.

pub mod server;

pub use server::{start, ServerError, ServerHandle};
