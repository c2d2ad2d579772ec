//! Domain ownership and analytics models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A row of the owned-domains table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub owned_by: String,
    pub domain: String,
}

/// Analytics of a single owned domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalytics {
    pub domain: String,
    pub owned_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub indexed_pages: Vec<IndexedPage>,
}

/// A page of the domain that made it into the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPage {
    pub url: String,
    pub domain: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Type-token ratio of the page text.
    #[serde(default, deserialize_with = "number_or_string")]
    pub ttr: f64,
    /// Detected localization.
    #[serde(default)]
    pub loc: String,
}

/// Response of `get_ownership`: the TXT record the user has to publish.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnershipKey {
    pub for_domain: String,
    pub txt_record_content: String,
}

/// Response of `check_dns_record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OwnershipCheck {
    pub ownership_verified: bool,
    #[serde(default)]
    pub queue_position: u64,
}

/// What the console shows for one domain: the owned record and, when the
/// analytics service answered, its analytics.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainOverview {
    pub record: DomainRecord,
    pub analytics: Option<DomainAnalytics>,
}

/// The indexer reports `ttr` as a number while older payloads carry a string.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
