//! Indexing system status and URL submission.

use tracing::info;

use super::{ApiClient, ApiError};
use crate::models::telemetry::IndexSysStatus;
use crate::transport::ApiRequest;

impl ApiClient {
    /// Current queue length and number of indexed URLs.
    pub async fn index_sys_status(&self) -> Result<IndexSysStatus, ApiError> {
        let url = self.endpoint("api/index_sys_status")?;
        let response = self.send(ApiRequest::get(url), "index_sys_status").await?;
        response.json()
    }

    /// Push URLs onto the crawl queue.
    pub async fn queue_urls(&self, urls: &[String]) -> Result<(), ApiError> {
        let url = self.endpoint("index/urls")?;
        let body = serde_json::json!(urls);
        self.send(ApiRequest::post_json(url, body), "queue_urls").await?;
        info!(count = urls.len(), "urls queued for indexing");
        Ok(())
    }
}
