//! Scoped token minting and verification.
//!
//! A scoped token is an HS256 JWT carrying `{email, user_id, session_id}` and
//! living exactly 60 seconds. It is minted from the session principal for
//! every analytics request and never cached.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::config::ConfigError;
use crate::models::auth::{Principal, ScopedClaims};

/// Scoped token lifetime: 60 seconds.
pub const SCOPED_TOKEN_EXPIRY_SECS: i64 = 60;

/// A signed, time-boxed credential for the analytics service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedToken {
    token: String,
    claims: ScopedClaims,
}

impl ScopedToken {
    /// The compact JWT, as sent in the `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &ScopedClaims {
        &self.claims
    }

    /// The HMAC-SHA256 signature segment.
    pub fn signature(&self) -> &str {
        self.token.rsplit('.').next().unwrap_or_default()
    }

    pub fn issued_at(&self) -> i64 {
        self.claims.iat
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// Whether the token can still be presented at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() < self.claims.exp
    }
}

/// Mint a scoped token for `principal`, issued now.
pub fn mint_scoped_token(principal: &Principal, secret: &[u8]) -> Result<ScopedToken, AuthError> {
    mint_scoped_token_at(principal, secret, Utc::now())
}

/// Mint a scoped token for `principal` with an explicit issue time.
pub fn mint_scoped_token_at(
    principal: &Principal,
    secret: &[u8],
    issued_at: DateTime<Utc>,
) -> Result<ScopedToken, AuthError> {
    if !principal.is_complete() {
        return Err(AuthError::Unauthenticated);
    }

    let claims = ScopedClaims {
        email: principal.email.clone(),
        user_id: principal.id.clone(),
        session_id: principal.session_id.clone(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::seconds(SCOPED_TOKEN_EXPIRY_SECS)).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Token(format!("jwt encode: {e}")))?;

    debug!(user_id = %claims.user_id, exp = claims.exp, "minted scoped token");
    Ok(ScopedToken { token, claims })
}

/// Verify a scoped token against `secret`, treating `now` as the current time.
///
/// Expiry is checked here rather than by `jsonwebtoken` so callers control
/// the clock and no leeway is applied.
pub fn verify_scoped_token(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<ScopedClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let claims = decode::<ScopedClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| AuthError::Token(format!("jwt decode: {e}")))?
        .claims;

    if now.timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

/// Resolve the signing secret: env var `JOOGLE_JWT_SECRET` → `JWT_SECRET`.
///
/// The secret is shared with the analytics service, so there is no generated
/// fallback.
pub fn resolve_signing_secret() -> Result<String, ConfigError> {
    ["JOOGLE_JWT_SECRET", "JWT_SECRET"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|secret| !secret.is_empty())
        .ok_or(ConfigError::Missing("JOOGLE_JWT_SECRET"))
}
