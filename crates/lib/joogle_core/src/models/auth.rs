//! Authentication domain models.

use serde::{Deserialize, Serialize};

/// The authenticated identity of the current user.
///
/// Extracted from the session credential by a
/// [`SessionProvider`](crate::auth::SessionProvider). Never persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub session_id: String,
}

impl Principal {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            session_id: session_id.into(),
        }
    }

    /// True when every identity claim is present.
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.email.is_empty() && !self.session_id.is_empty()
    }
}

/// JWT claims embedded in scoped analytics tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedClaims {
    pub email: String,
    pub user_id: String,
    pub session_id: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Claims read from a session access token.
///
/// Only the fields the console needs; everything else in the token is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user ID.
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub session_id: String,
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            session_id: claims.session_id,
        }
    }
}
