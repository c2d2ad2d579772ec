//! Per-domain analytics, authorised with a freshly minted scoped token.

use tracing::{debug, warn};

use super::{ApiClient, ApiError};
use crate::auth::jwt::{ScopedToken, mint_scoped_token};
use crate::models::auth::Principal;
use crate::models::domain::DomainAnalytics;
use crate::transport::ApiRequest;

impl ApiClient {
    /// `GET api/domain/get_analytics` with `token` as the `Authorization` value.
    pub async fn get_analytics(
        &self,
        domain: &str,
        token: &ScopedToken,
    ) -> Result<DomainAnalytics, ApiError> {
        let mut url = self.endpoint("api/domain/get_analytics")?;
        url.query_pairs_mut().append_pair("domain", domain);

        let request = ApiRequest::get(url).header("Authorization", token.as_str());
        let response = self.send(request, "get_analytics").await?;
        response.json()
    }
}

/// Fetch analytics for `domain`, keeping every failure distinct.
///
/// A new token is minted for each call; tokens are never reused.
pub async fn try_fetch_analytics(
    api: &ApiClient,
    principal: Option<&Principal>,
    secret: &[u8],
    domain: &str,
) -> Result<DomainAnalytics, ApiError> {
    let principal = principal.ok_or(ApiError::Unauthenticated)?;
    let token = mint_scoped_token(principal, secret)?;
    api.get_analytics(domain, &token).await
}

/// Fetch analytics for `domain`.
///
/// Returns `None` when nobody is signed in (without touching the network) and
/// on any failure: unauthorised, not found, server error and malformed bodies
/// all look the same to the caller. Single attempt, no retries.
pub async fn fetch_analytics(
    api: &ApiClient,
    principal: Option<&Principal>,
    secret: &[u8],
    domain: &str,
) -> Option<DomainAnalytics> {
    match try_fetch_analytics(api, principal, secret, domain).await {
        Ok(analytics) => Some(analytics),
        Err(ApiError::Unauthenticated) => {
            debug!(%domain, "analytics skipped: no principal");
            None
        }
        Err(e) => {
            warn!(%domain, error = %e, "analytics unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use url::Url;

    use super::*;
    use crate::auth::jwt::verify_scoped_token;
    use crate::transport::mock::MockTransport;

    const PATH: &str = "/api/domain/get_analytics";
    const BODY: &str = r#"{
        "domain": "example.com",
        "owned_by": "u-1",
        "created_at": "2024-03-01T10:00:00Z",
        "indexed_pages": [{"url": "https://example.com/", "domain": "example.com",
                           "title": "Home", "description": "", "ttr": 0.3, "loc": "en"}]
    }"#;

    fn principal() -> Principal {
        Principal::new("u-1", "ada@example.com", "s-1")
    }

    fn client(transport: std::sync::Arc<MockTransport>) -> ApiClient {
        ApiClient::new(Url::parse("http://api.test/").unwrap(), transport)
    }

    #[tokio::test]
    async fn no_principal_means_no_network_call() {
        let transport = MockTransport::new();
        let api = client(transport.clone());

        let result = fetch_analytics(&api, None, b"secret", "example.com").await;

        assert!(result.is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn success_returns_parsed_analytics() {
        let transport = MockTransport::new();
        transport.respond(PATH, 200, BODY);
        let api = client(transport.clone());

        let analytics = fetch_analytics(&api, Some(&principal()), b"secret", "example.com")
            .await
            .unwrap();

        assert_eq!(analytics.domain, "example.com");
        assert_eq!(analytics.indexed_pages.len(), 1);

        let call = &transport.calls()[0];
        let query: Vec<_> = call.url.query_pairs().into_owned().collect();
        assert_eq!(query, vec![("domain".to_string(), "example.com".to_string())]);
        let token = call.header_value("Authorization").unwrap();
        let claims = verify_scoped_token(token, b"secret", Utc::now()).unwrap();
        assert_eq!(claims.user_id, "u-1");
    }

    #[tokio::test]
    async fn every_failure_status_collapses_to_none() {
        for status in [401, 404, 500] {
            let transport = MockTransport::new();
            transport.respond(PATH, status, "");
            let api = client(transport.clone());

            let result = fetch_analytics(&api, Some(&principal()), b"secret", "example.com").await;
            assert!(result.is_none(), "status {status} should yield None");
            assert_eq!(transport.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn failures_stay_distinct_underneath() {
        let transport = MockTransport::new();
        transport.respond(PATH, 401, "");
        transport.respond(PATH, 200, "not json");
        let api = client(transport);

        let unauthorised =
            try_fetch_analytics(&api, Some(&principal()), b"secret", "example.com").await;
        assert!(matches!(
            unauthorised,
            Err(ApiError::RequestFailed { status: 401, .. })
        ));

        let malformed =
            try_fetch_analytics(&api, Some(&principal()), b"secret", "example.com").await;
        assert!(matches!(malformed, Err(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn each_call_sends_its_own_token() {
        let transport = MockTransport::new();
        transport.respond(PATH, 200, BODY);
        transport.respond(PATH, 200, BODY);
        let api = client(transport.clone());

        fetch_analytics(&api, Some(&principal()), b"secret", "example.com").await;
        fetch_analytics(&api, Some(&principal()), b"secret", "example.com").await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.header_value("Authorization").is_some()));
    }
}
