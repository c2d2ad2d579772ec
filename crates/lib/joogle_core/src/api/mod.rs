//! Client for the indexing/analytics API.
//!
//! # Endpoints
//!
//! - `GET  api/domain/get_analytics?domain=` ([`analytics`])
//! - `GET  api/domain/get_ownership?domain=&uid=` ([`ownership`])
//! - `GET  api/domain/check_dns_record?domain=&uid=` ([`ownership`])
//! - `GET  api/index_sys_status` ([`indexing`])
//! - `POST index/urls` ([`indexing`])

pub mod analytics;
pub mod indexing;
pub mod ownership;

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::auth::AuthError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Errors of a single API call.
///
/// Callers in the console collapse these into sentinels; the variants stay
/// distinct so logs and future callers can tell them apart.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{operation} failed with HTTP {status}")]
    RequestFailed { operation: &'static str, status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error(transparent)]
    Token(#[from] AuthError),
}

/// Indexing API client bound to a base URL.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a request and return the response if its status is 2xx.
    async fn send(
        &self,
        request: ApiRequest,
        operation: &'static str,
    ) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(request).await?;
        Self::ensure_success(response, operation)
    }

    /// Checks the response status; returns the response on success.
    fn ensure_success(
        response: ApiResponse,
        operation: &'static str,
    ) -> Result<ApiResponse, ApiError> {
        if response.is_success() {
            return Ok(response);
        }
        Err(ApiError::RequestFailed {
            operation,
            status: response.status,
        })
    }
}
