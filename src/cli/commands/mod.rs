//! CLI command handlers.
//!
//! Each submodule handles a top-level command variant from [`super::Commands`].

// These modules contain CLI command handlers, not public library API.
#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod project;
#[allow(clippy::missing_errors_doc)]
pub mod sync;
