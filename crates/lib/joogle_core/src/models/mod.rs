//! Domain models shared across the console core.
//!
//! Wire shapes match the JSON emitted by the indexing API and the domains
//! table.

pub mod auth;
pub mod domain;
pub mod telemetry;
