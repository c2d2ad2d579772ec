//! Console context.
//!
//! Owns the collaborators (session, owned-domain store, transport) and hands
//! them to the flows that need them. Views hold a `Console` instead of
//! reaching for globals.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::api::{ApiClient, ApiError, analytics};
use crate::auth::SessionProvider;
use crate::config::ConsoleConfig;
use crate::domain::{ClaimController, ClaimError, DomainClaim, DomainStore, StoreError};
use crate::models::auth::Principal;
use crate::models::domain::{DomainAnalytics, DomainOverview, DomainRecord};
use crate::telemetry::TelemetrySampler;
use crate::transport::Transport;

pub struct Console {
    config: ConsoleConfig,
    session: Arc<dyn SessionProvider>,
    domains: Arc<dyn DomainStore>,
    api: ApiClient,
    claims: ClaimController,
}

impl Console {
    pub fn new(
        config: ConsoleConfig,
        session: Arc<dyn SessionProvider>,
        domains: Arc<dyn DomainStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api = ApiClient::new(config.api_url.clone(), transport);
        let claims = ClaimController::new(api.clone(), domains.clone());
        Self {
            config,
            session,
            domains,
            api,
            claims,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn claims(&self) -> &ClaimController {
        &self.claims
    }

    pub async fn principal(&self) -> Option<Principal> {
        self.session.current_principal().await
    }

    /// Domains owned by the signed-in user; empty when nobody is signed in.
    pub async fn owned_domains(&self) -> Result<Vec<DomainRecord>, StoreError> {
        match self.principal().await {
            Some(principal) => self.domains.list_owned_domains(&principal.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub fn subscribe_domains(&self) -> watch::Receiver<Vec<DomainRecord>> {
        self.domains.subscribe()
    }

    /// Analytics for `domain`, or `None` if unavailable for any reason.
    pub async fn fetch_analytics(&self, domain: &str) -> Option<DomainAnalytics> {
        let principal = self.principal().await;
        analytics::fetch_analytics(
            &self.api,
            principal.as_ref(),
            self.config.signing_secret.as_bytes(),
            domain,
        )
        .await
    }

    /// The owned record for `domain` with its analytics.
    ///
    /// `None` when the domain is not among the user's domains; analytics are
    /// only requested for owned domains.
    pub async fn domain_overview(&self, domain: &str) -> Result<Option<DomainOverview>, StoreError> {
        let record = self
            .owned_domains()
            .await?
            .into_iter()
            .find(|record| record.domain == domain);

        let Some(record) = record else {
            debug!(%domain, "domain is not owned by the current user");
            return Ok(None);
        };
        let analytics = self.fetch_analytics(domain).await;
        Ok(Some(DomainOverview { record, analytics }))
    }

    pub async fn request_verification_key(&self, domain: &str) -> Result<DomainClaim, ClaimError> {
        let principal = self.principal().await.ok_or(ClaimError::Unauthenticated)?;
        self.claims.request_verification_key(domain, &principal).await
    }

    pub async fn check_verification(&self, domain: &str) -> Result<DomainClaim, ClaimError> {
        let principal = self.principal().await.ok_or(ClaimError::Unauthenticated)?;
        self.claims.check_verification(domain, &principal).await
    }

    /// Submit URLs to the crawl queue.
    pub async fn queue_urls(&self, urls: &[String]) -> Result<(), ApiError> {
        self.api.queue_urls(urls).await
    }

    /// A sampler over this console's API, configured from the console config.
    pub fn telemetry_sampler(&self) -> TelemetrySampler {
        TelemetrySampler::new(
            self.api.clone(),
            self.config.sample_interval,
            self.config.sample_history,
        )
    }

    /// End the session and drop the active claim.
    pub async fn sign_out(&self) {
        self.session.sign_out().await;
        self.claims.discard();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::auth::AccessTokenSession;
    use crate::domain::MemoryDomainStore;
    use crate::transport::mock::MockTransport;

    const ANALYTICS: &str = "/api/domain/get_analytics";

    fn console(transport: &Arc<MockTransport>, signed_in: bool) -> Console {
        let session = if signed_in {
            AccessTokenSession::with_principal(Principal::new("u-1", "ada@example.com", "s-1"))
        } else {
            AccessTokenSession::anonymous()
        };
        let store = MemoryDomainStore::with_records(vec![DomainRecord {
            id: "d-1".into(),
            created_at: Utc::now(),
            owned_by: "u-1".into(),
            domain: "example.com".into(),
        }]);
        Console::new(
            ConsoleConfig::new("secret"),
            Arc::new(session),
            Arc::new(store),
            transport.clone(),
        )
    }

    #[tokio::test]
    async fn overview_of_owned_domain_includes_analytics() {
        let transport = MockTransport::new();
        transport.respond(
            ANALYTICS,
            200,
            r#"{"domain":"example.com","owned_by":"u-1","created_at":"2024-03-01T10:00:00Z","indexed_pages":[]}"#,
        );
        let console = console(&transport, true);

        let overview = console.domain_overview("example.com").await.unwrap().unwrap();
        assert_eq!(overview.record.id, "d-1");
        assert_eq!(overview.analytics.unwrap().owned_by, "u-1");
    }

    #[tokio::test]
    async fn overview_of_unknown_domain_is_none() {
        let transport = MockTransport::new();
        let console = console(&transport, true);

        assert!(console.domain_overview("other.com").await.unwrap().is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn owned_domains_are_published_to_subscribers() {
        let transport = MockTransport::new();
        let console = console(&transport, true);
        let rx = console.subscribe_domains();

        console.owned_domains().await.unwrap();
        assert_eq!(rx.borrow()[0].domain, "example.com");
    }

    #[tokio::test]
    async fn signed_out_console_stays_off_the_network() {
        let transport = MockTransport::new();
        let console = console(&transport, true);
        console.sign_out().await;

        assert!(console.fetch_analytics("example.com").await.is_none());
        assert!(console.owned_domains().await.unwrap().is_empty());
        assert!(matches!(
            console.request_verification_key("example.com").await,
            Err(ClaimError::Unauthenticated)
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn claim_flow_through_console() {
        let transport = MockTransport::new();
        transport.respond(
            "/api/domain/get_ownership",
            200,
            r#"{"for_domain":"new.com","txt_record_content":"joogleown:new.com>u-1"}"#,
        );
        transport.respond(
            "/api/domain/check_dns_record",
            200,
            r#"{"ownership_verified":true,"queue_position":3}"#,
        );
        let console = console(&transport, true);

        let claim = console.request_verification_key("new.com").await.unwrap();
        assert_eq!(
            claim.verification_token.as_deref(),
            Some("joogleown:new.com>u-1")
        );
        let claim = console.check_verification("new.com").await.unwrap();
        assert_eq!(claim.queue_position, 3);

        console.sign_out().await;
        assert!(console.claims().active().is_none());
    }
}
