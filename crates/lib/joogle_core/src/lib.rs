//! # joogle_core
//!
//! Core logic of the Joogle search console: scoped analytics tokens, the
//! domain ownership claim flow, indexing telemetry and analytics fetching.

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod domain;
pub mod models;
pub mod telemetry;
pub mod transport;

pub use console::Console;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
