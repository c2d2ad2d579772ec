//! Domain claim state machine.
//!
//! ```text
//! Requested ──get_ownership ok──▶ KeyIssued ──check_dns_record verified──▶ Verified
//!     ▲                            │  ▲   ▲                                   │
//!     └── get_ownership failed     └──┘   └─────────── rejected ──────────────┘
//!                          rejected / request failed
//! ```
//!
//! `phase == Verified` holds exactly when `ownership == Verified`. A failed
//! check request on a verified claim changes nothing.
//!
//! Every transition is triggered by an explicit call; nothing polls on its
//! own. Only one claim is active at a time and a `loading` flag rejects
//! overlapping calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::ClaimError;
use super::store::DomainStore;
use crate::api::ApiClient;
use crate::models::auth::Principal;
use crate::models::domain::{OwnershipCheck, OwnershipKey};

/// User-facing message when a verification attempt does not confirm ownership.
pub const OWNERSHIP_NOT_VERIFIED: &str = "ownership not verified";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPhase {
    Requested,
    KeyIssued,
    Verified,
}

/// Outcome of the DNS ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// Not checked yet, or the last check never got an answer.
    #[default]
    Unknown,
    Verified,
    /// The backend looked at the TXT records and did not find the key.
    Rejected,
}

/// One onboarding attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainClaim {
    /// Domain as typed by the user.
    pub requested_domain: String,
    /// Canonical domain name; the backend's once a key is issued.
    pub domain_name: String,
    /// Content of the TXT record to publish.
    pub verification_token: Option<String>,
    pub ownership: Ownership,
    pub queue_position: u64,
    pub phase: ClaimPhase,
    /// Message to show the user, if the last check failed.
    pub error: Option<String>,
}

impl DomainClaim {
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            domain_name: domain.clone(),
            requested_domain: domain,
            verification_token: None,
            ownership: Ownership::Unknown,
            queue_position: 0,
            phase: ClaimPhase::Requested,
            error: None,
        }
    }

    fn matches(&self, domain: &str) -> bool {
        self.domain_name == domain || self.requested_domain == domain
    }

    fn key_issued(&mut self, key: OwnershipKey) {
        self.domain_name = key.for_domain;
        self.verification_token = Some(key.txt_record_content);
        self.phase = ClaimPhase::KeyIssued;
    }

    /// Apply a check answer. Returns true when the claim just became verified.
    fn apply_check(&mut self, check: OwnershipCheck) -> bool {
        if !check.ownership_verified {
            // A verified domain whose record is gone waits for it again.
            self.ownership = Ownership::Rejected;
            self.queue_position = 0;
            self.phase = ClaimPhase::KeyIssued;
            self.error = Some(OWNERSHIP_NOT_VERIFIED.to_string());
            return false;
        }

        let newly_verified = self.phase != ClaimPhase::Verified;
        self.ownership = Ownership::Verified;
        self.queue_position = check.queue_position;
        self.phase = ClaimPhase::Verified;
        self.error = None;
        newly_verified
    }

    /// The check request itself failed. Ownership is left as it was and a
    /// verified claim stays verified.
    fn check_failed(&mut self) {
        if self.phase != ClaimPhase::Verified {
            self.error = Some(OWNERSHIP_NOT_VERIFIED.to_string());
        }
    }
}

/// Releases the `loading` flag when dropped, including on cancellation.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the active domain claim.
pub struct ClaimController {
    api: ApiClient,
    store: Arc<dyn DomainStore>,
    active: Mutex<Option<DomainClaim>>,
    loading: AtomicBool,
}

impl ClaimController {
    pub fn new(api: ApiClient, store: Arc<dyn DomainStore>) -> Self {
        Self {
            api,
            store,
            active: Mutex::new(None),
            loading: AtomicBool::new(false),
        }
    }

    /// True while a claim request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Snapshot of the active claim.
    pub fn active(&self) -> Option<DomainClaim> {
        self.with_active(|active| active.clone())
    }

    /// Drop the active claim (the user navigated away).
    pub fn discard(&self) {
        self.with_active(|active| *active = None);
    }

    fn with_active<R>(&self, f: impl FnOnce(&mut Option<DomainClaim>) -> R) -> R {
        let mut guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn begin(&self) -> Result<LoadingGuard<'_>, ClaimError> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| LoadingGuard(&self.loading))
            .map_err(|_| ClaimError::Busy)
    }

    /// Start a claim for `domain` and ask the backend for its verification key.
    ///
    /// Replaces any claim for another domain. If the backend does not answer
    /// with a key, a claim already open for `domain` is kept as it was and a
    /// new one stays `Requested`; resubmitting retries.
    pub async fn request_verification_key(
        &self,
        domain: &str,
        principal: &Principal,
    ) -> Result<DomainClaim, ClaimError> {
        if !principal.is_complete() {
            return Err(ClaimError::Unauthenticated);
        }
        let _loading = self.begin()?;

        self.with_active(|active| {
            if !active.as_ref().is_some_and(|claim| claim.matches(domain)) {
                *active = Some(DomainClaim::new(domain));
            }
        });

        match self.api.get_ownership(domain, &principal.id).await {
            Ok(key) => {
                info!(%domain, canonical = %key.for_domain, "verification key issued");
                let mut claim = DomainClaim::new(domain);
                claim.key_issued(key);
                self.with_active(|active| *active = Some(claim));
            }
            Err(e) => warn!(%domain, error = %e, "verification key request failed"),
        }

        self.active()
            .ok_or_else(|| ClaimError::NoActiveClaim(domain.to_string()))
    }

    /// Ask the backend to check the TXT record of the active claim for `domain`.
    ///
    /// A rejection and a failed request both leave the claim in `KeyIssued`
    /// with [`OWNERSHIP_NOT_VERIFIED`] as its error; only a rejection marks
    /// ownership as [`Ownership::Rejected`]. A rejection also moves a verified
    /// claim back to `KeyIssued`. The principal's owned-domain list is
    /// refreshed on every transition into `Verified`.
    pub async fn check_verification(
        &self,
        domain: &str,
        principal: &Principal,
    ) -> Result<DomainClaim, ClaimError> {
        if !principal.is_complete() {
            return Err(ClaimError::Unauthenticated);
        }
        let _loading = self.begin()?;

        let claim = self
            .active()
            .filter(|claim| claim.matches(domain))
            .ok_or_else(|| ClaimError::NoActiveClaim(domain.to_string()))?;
        if claim.phase == ClaimPhase::Requested {
            return Err(ClaimError::KeyNotIssued(domain.to_string()));
        }

        let outcome = self
            .api
            .check_dns_record(&claim.domain_name, &principal.id)
            .await;

        let newly_verified = self.with_active(|active| {
            let Some(claim) = active.as_mut() else {
                return false;
            };
            match outcome {
                Ok(check) => claim.apply_check(check),
                Err(ref e) => {
                    warn!(domain = %claim.domain_name, error = %e, "ownership check failed");
                    claim.check_failed();
                    false
                }
            }
        });

        if newly_verified {
            info!(domain = %claim.domain_name, "domain ownership verified");
            if let Err(e) = self.store.refresh_for(&principal.id).await {
                warn!(error = %e, "owned domains refresh failed");
            }
        }

        self.active()
            .ok_or_else(|| ClaimError::NoActiveClaim(domain.to_string()))
    }
}
