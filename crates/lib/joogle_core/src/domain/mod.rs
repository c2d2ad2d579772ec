//! Domain onboarding: the ownership claim flow and the owned-domain list.

pub mod claim;
pub mod store;

use thiserror::Error;

use crate::api::ApiError;

pub use claim::{ClaimController, ClaimPhase, DomainClaim, Ownership};
pub use store::{DomainStore, MemoryDomainStore, RestDomainStore};

/// Errors raised before a claim transition reaches the network.
///
/// Network failures never surface here: they leave the claim in place and,
/// for verification, set its user-facing error message.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("A claim request is already in flight")]
    Busy,

    #[error("No active claim for {0}")]
    NoActiveClaim(String),

    #[error("No verification key issued yet for {0}")]
    KeyNotIssued(String),
}

/// Owned-domain store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Nothing to refresh: no owner listed yet")]
    NoOwner,
}
