//! Domain ownership handshake: TXT key issuance and DNS record check.

use tracing::debug;

use super::{ApiClient, ApiError};
use crate::models::domain::{OwnershipCheck, OwnershipKey};
use crate::transport::ApiRequest;

impl ApiClient {
    /// Ask the backend for the TXT record proving `uid` owns `domain`.
    ///
    /// The backend canonicalises the domain; use the returned `for_domain`.
    pub async fn get_ownership(&self, domain: &str, uid: &str) -> Result<OwnershipKey, ApiError> {
        let mut url = self.endpoint("api/domain/get_ownership")?;
        url.query_pairs_mut()
            .append_pair("domain", domain)
            .append_pair("uid", uid);

        debug!(%domain, "requesting ownership key");
        let response = self.send(ApiRequest::get(url), "get_ownership").await?;
        response.json()
    }

    /// Ask the backend to look up the domain's TXT records.
    pub async fn check_dns_record(
        &self,
        domain: &str,
        uid: &str,
    ) -> Result<OwnershipCheck, ApiError> {
        let mut url = self.endpoint("api/domain/check_dns_record")?;
        url.query_pairs_mut()
            .append_pair("domain", domain)
            .append_pair("uid", uid);

        debug!(%domain, "checking dns record");
        let response = self.send(ApiRequest::get(url), "check_dns_record").await?;
        response.json()
    }
}
