//! Indexing telemetry models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `/api/index_sys_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSysStatus {
    pub queue_length: i64,
    pub indexed_urls: i64,
}

/// One poll of the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySample {
    pub queue_length: i64,
    pub indexed_urls: i64,
    pub sampled_at: DateTime<Utc>,
}

impl TelemetrySample {
    pub fn new(status: IndexSysStatus, sampled_at: DateTime<Utc>) -> Self {
        Self {
            queue_length: status.queue_length,
            indexed_urls: status.indexed_urls,
            sampled_at,
        }
    }
}

/// Latest derived telemetry values, published after every successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySnapshot {
    pub queue_length: i64,
    pub indexed_urls: i64,
    /// Queue growth in links per second. Negative when the queue drains.
    pub tendency: f64,
    /// Number of samples taken so far.
    pub samples: u64,
    pub sampled_at: Option<DateTime<Utc>>,
}
