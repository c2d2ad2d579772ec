//! Session provider seam.

use std::sync::RwLock;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::info;

use super::AuthError;
use crate::models::auth::{Principal, SessionClaims};

/// Consumer-provided identity/session provider.
///
/// The console never refreshes or persists sessions itself; it only asks who
/// is signed in right now.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The currently authenticated principal, if any.
    async fn current_principal(&self) -> Option<Principal>;

    /// End the current session.
    async fn sign_out(&self);
}

/// Session backed by an access token issued by the identity provider.
///
/// The token's claims are read without checking its signature: the identity
/// provider is the authority, and the token is only used to learn who the
/// user is before minting scoped tokens.
#[derive(Debug, Default)]
pub struct AccessTokenSession {
    principal: RwLock<Option<Principal>>,
}

impl AccessTokenSession {
    /// Session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session for an already-known principal.
    pub fn with_principal(principal: Principal) -> Self {
        Self {
            principal: RwLock::new(Some(principal)),
        }
    }

    /// Build a session from an access token.
    pub fn from_access_token(access_token: &str) -> Result<Self, AuthError> {
        let principal = principal_from_access_token(access_token)?;
        info!(user_id = %principal.id, "session restored from access token");
        Ok(Self::with_principal(principal))
    }
}

#[async_trait]
impl SessionProvider for AccessTokenSession {
    async fn current_principal(&self) -> Option<Principal> {
        self.principal
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(Principal::is_complete)
    }

    async fn sign_out(&self) {
        if let Ok(mut guard) = self.principal.write() {
            *guard = None;
        }
        info!("signed out");
    }
}

/// Decode `{sub, email, session_id}` from a session access token.
pub fn principal_from_access_token(access_token: &str) -> Result<Principal, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = decode::<SessionClaims>(access_token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::Token(format!("session token: {e}")))?
        .claims;

    let principal = Principal::from(claims);
    if !principal.is_complete() {
        return Err(AuthError::Unauthenticated);
    }
    Ok(principal)
}
