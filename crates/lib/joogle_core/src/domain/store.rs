//! Owned-domain store.
//!
//! The list of domains owned by the signed-in user is published on a
//! `watch` channel: views subscribe instead of polling, and a refresh
//! (e.g. after a domain is verified) reaches every subscriber.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

use super::StoreError;
use crate::api::ApiError;
use crate::config::DomainStoreConfig;
use crate::models::domain::DomainRecord;
use crate::transport::{ApiRequest, Transport};

/// Consumer-provided owned-domain store.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Load the domains owned by `principal_id` and publish them.
    async fn list_owned_domains(&self, principal_id: &str)
    -> Result<Vec<DomainRecord>, StoreError>;

    /// Reload the list for the last listed owner.
    async fn refresh(&self) -> Result<(), StoreError>;

    /// Reload and publish the list for `principal_id`, whether or not it was
    /// listed before.
    async fn refresh_for(&self, principal_id: &str) -> Result<(), StoreError>;

    /// Subscribe to the published list.
    fn subscribe(&self) -> watch::Receiver<Vec<DomainRecord>>;
}

/// Publishing half shared by the store implementations.
struct Published {
    owner: Mutex<Option<String>>,
    domains: watch::Sender<Vec<DomainRecord>>,
}

impl Published {
    fn new() -> Self {
        let (domains, _) = watch::channel(Vec::new());
        Self {
            owner: Mutex::new(None),
            domains,
        }
    }

    fn owner(&self) -> Option<String> {
        self.owner.lock().ok().and_then(|owner| owner.clone())
    }

    fn publish(&self, principal_id: &str, records: &[DomainRecord]) {
        if let Ok(mut owner) = self.owner.lock() {
            *owner = Some(principal_id.to_string());
        }
        self.domains.send_replace(records.to_vec());
    }
}

/// Domains table served by PostgREST.
pub struct RestDomainStore {
    table_url: Url,
    api_key: String,
    transport: Arc<dyn Transport>,
    published: Published,
}

impl RestDomainStore {
    pub fn new(config: &DomainStoreConfig, transport: Arc<dyn Transport>) -> Result<Self, StoreError> {
        let table_url = config
            .url
            .join("rest/v1/domains")
            .map_err(ApiError::from)?;
        Ok(Self {
            table_url,
            api_key: config.api_key.clone(),
            transport,
            published: Published::new(),
        })
    }

    async fn fetch(&self, principal_id: &str) -> Result<Vec<DomainRecord>, StoreError> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("owned_by", &format!("eq.{principal_id}"));

        let request = ApiRequest::get(url)
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key));
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::RequestFailed {
                operation: "list_owned_domains",
                status: response.status,
            }
            .into());
        }
        Ok(response.json()?)
    }
}

#[async_trait]
impl DomainStore for RestDomainStore {
    async fn list_owned_domains(
        &self,
        principal_id: &str,
    ) -> Result<Vec<DomainRecord>, StoreError> {
        let records = self.fetch(principal_id).await?;
        debug!(owner = %principal_id, count = records.len(), "owned domains loaded");
        self.published.publish(principal_id, &records);
        Ok(records)
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let owner = self.published.owner().ok_or(StoreError::NoOwner)?;
        self.refresh_for(&owner).await
    }

    async fn refresh_for(&self, principal_id: &str) -> Result<(), StoreError> {
        let records = self.fetch(principal_id).await?;
        info!(owner = %principal_id, count = records.len(), "owned domains refreshed");
        self.published.publish(principal_id, &records);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<DomainRecord>> {
        self.published.domains.subscribe()
    }
}

/// In-memory store. Used when no domains table is configured.
pub struct MemoryDomainStore {
    rows: Mutex<Vec<DomainRecord>>,
    refreshes: AtomicUsize,
    published: Published,
}

impl Default for MemoryDomainStore {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
            published: Published::new(),
        }
    }
}

impl MemoryDomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<DomainRecord>) -> Self {
        let store = Self::default();
        if let Ok(mut rows) = store.rows.lock() {
            *rows = records;
        }
        store
    }

    pub fn insert(&self, record: DomainRecord) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.push(record);
        }
    }

    /// How many times the list was refreshed, through either refresh method.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn owned_by(&self, principal_id: &str) -> Vec<DomainRecord> {
        self.rows
            .lock()
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.owned_by == principal_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DomainStore for MemoryDomainStore {
    async fn list_owned_domains(
        &self,
        principal_id: &str,
    ) -> Result<Vec<DomainRecord>, StoreError> {
        let records = self.owned_by(principal_id);
        self.published.publish(principal_id, &records);
        Ok(records)
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        match self.published.owner() {
            Some(owner) => self.refresh_for(&owner).await,
            None => {
                self.refreshes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    async fn refresh_for(&self, principal_id: &str) -> Result<(), StoreError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let records = self.owned_by(principal_id);
        self.published.publish(principal_id, &records);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<DomainRecord>> {
        self.published.domains.subscribe()
    }
}
