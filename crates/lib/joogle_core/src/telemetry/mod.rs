//! Indexing telemetry: queue length history and its tendency.
//!
//! The tendency highlights how fast URLs are added to or removed from the
//! crawl queue. A rising tendency means the indexer may overload; a falling
//! one means there is room to index more.

pub mod sampler;

use std::collections::VecDeque;

pub use sampler::TelemetrySampler;

/// Bounded history of raw `queue_length` samples.
///
/// The tendency only depends on the first sample ever taken, the latest one
/// and the total count, so old samples can be dropped without changing it.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    recent: VecDeque<i64>,
    capacity: usize,
    first: Option<i64>,
    count: u64,
    period_secs: f64,
}

impl SampleHistory {
    /// History keeping at most `capacity` samples taken every `period_secs`.
    pub fn new(capacity: usize, period_secs: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
            first: None,
            count: 0,
            period_secs,
        }
    }

    pub fn push(&mut self, queue_length: i64) {
        if self.first.is_none() {
            self.first = Some(queue_length);
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(queue_length);
        self.count += 1;
    }

    /// Total number of samples pushed, including evicted ones.
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Samples still held in memory, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = i64> + '_ {
        self.recent.iter().copied()
    }

    pub fn latest(&self) -> Option<i64> {
        self.recent.back().copied()
    }

    /// Smoothed queue growth in links per second.
    ///
    /// `Σ(s_i - s_{i-1}) / (N * P - 1) / P` where `P` is the sampling period;
    /// the sum telescopes to `s_last - s_first`. Zero with fewer than two
    /// samples.
    pub fn tendency(&self) -> f64 {
        let (Some(first), Some(last)) = (self.first, self.latest()) else {
            return 0.0;
        };
        if self.count < 2 {
            return 0.0;
        }
        let total = (last - first) as f64;
        total / (self.count as f64 * self.period_secs - 1.0) / self.period_secs
    }
}
