//! Authentication: the session principal and scoped analytics tokens.
//!
//! The session itself (login, refresh, logout) belongs to the identity
//! provider; the console only reads the principal out of it and derives
//! short-lived tokens for the analytics service.

pub mod jwt;
pub mod session;

use thiserror::Error;

pub use session::{AccessTokenSession, SessionProvider};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Token expired")]
    Expired,

    #[error("Token error: {0}")]
    Token(String),
}
