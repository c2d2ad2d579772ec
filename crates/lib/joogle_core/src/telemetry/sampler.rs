//! Periodic polling of `/api/index_sys_status`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::SampleHistory;
use crate::api::{ApiClient, ApiError};
use crate::models::telemetry::{IndexSysStatus, TelemetrySample, TelemetrySnapshot};

/// Samples the indexing status on a fixed period and derives the tendency.
pub struct TelemetrySampler {
    api: ApiClient,
    interval: Duration,
    history: SampleHistory,
    last: Option<TelemetrySample>,
}

impl TelemetrySampler {
    pub fn new(api: ApiClient, interval: Duration, history_capacity: usize) -> Self {
        Self {
            api,
            interval,
            history: SampleHistory::new(history_capacity, interval.as_secs_f64()),
            last: None,
        }
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Record a status answer and return the derived snapshot.
    pub fn record(&mut self, status: IndexSysStatus, sampled_at: DateTime<Utc>) -> TelemetrySnapshot {
        self.history.push(status.queue_length);
        self.last = Some(TelemetrySample::new(status, sampled_at));
        self.snapshot()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        match self.last {
            Some(sample) => TelemetrySnapshot {
                queue_length: sample.queue_length,
                indexed_urls: sample.indexed_urls,
                tendency: self.history.tendency(),
                samples: self.history.len(),
                sampled_at: Some(sample.sampled_at),
            },
            None => TelemetrySnapshot::default(),
        }
    }

    /// Poll the status endpoint once and record the answer.
    pub async fn sample_once(&mut self) -> Result<TelemetrySnapshot, ApiError> {
        let status = self.api.index_sys_status().await?;
        Ok(self.record(status, Utc::now()))
    }

    /// Run the sampler until `cancel` fires or every receiver is dropped.
    ///
    /// The first sample is taken immediately. A poll that is in flight when
    /// the sampler is cancelled completes, but its result is discarded.
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> (JoinHandle<()>, watch::Receiver<TelemetrySnapshot>) {
        let (tx, rx) = watch::channel(TelemetrySnapshot::default());
        let handle = tokio::spawn(self.run(tx, cancel));
        (handle, rx)
    }

    async fn run(mut self, tx: watch::Sender<TelemetrySnapshot>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let status = self.api.index_sys_status().await;
            if cancel.is_cancelled() || tx.is_closed() {
                debug!("telemetry consumer gone, discarding sample");
                break;
            }

            match status {
                Ok(status) => {
                    let snapshot = self.record(status, Utc::now());
                    debug!(
                        queue_length = snapshot.queue_length,
                        indexed_urls = snapshot.indexed_urls,
                        tendency = snapshot.tendency,
                        "telemetry sampled"
                    );
                    tx.send_replace(snapshot);
                }
                Err(e) => warn!(error = %e, "index status poll failed"),
            }
        }
        debug!("telemetry sampler stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use super::*;
    use crate::transport::mock::MockTransport;

    const STATUS: &str = "/api/index_sys_status";

    fn sampler(transport: &Arc<MockTransport>) -> TelemetrySampler {
        let api = ApiClient::new(Url::parse("http://api.test/").unwrap(), transport.clone());
        TelemetrySampler::new(api, Duration::from_secs(5), 720)
    }

    fn status(queue_length: i64, indexed_urls: i64) -> String {
        format!(r#"{{"queue_length":{queue_length},"indexed_urls":{indexed_urls}}}"#)
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_tendency_every_tick() {
        let transport = MockTransport::new();
        transport.respond(STATUS, 200, &status(10, 100));
        transport.respond(STATUS, 200, &status(15, 101));
        transport.respond(STATUS, 200, &status(20, 105));
        let cancel = CancellationToken::new();

        let (handle, mut rx) = sampler(&transport).spawn(cancel.clone());
        for _ in 0..3 {
            rx.changed().await.unwrap();
        }

        let snapshot = *rx.borrow();
        assert_eq!(snapshot.queue_length, 20);
        assert_eq!(snapshot.indexed_urls, 105);
        assert_eq!(snapshot.samples, 3);
        assert!((snapshot.tendency - 10.0 / 14.0 / 5.0).abs() < 1e-12);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_last_values() {
        let transport = MockTransport::new();
        transport.respond(STATUS, 200, &status(10, 100));
        transport.respond(STATUS, 500, "");
        transport.respond(STATUS, 200, &status(20, 110));
        let cancel = CancellationToken::new();

        let (handle, mut rx) = sampler(&transport).spawn(cancel.clone());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().queue_length, 10);

        rx.changed().await.unwrap();
        let snapshot = *rx.borrow();
        assert_eq!(transport.call_count(), 3);
        assert_eq!(snapshot.samples, 2);
        assert!((snapshot.tendency - 10.0 / 9.0 / 5.0).abs() < 1e-12);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_sampler_discards_in_flight_result() {
        let transport = MockTransport::new();
        transport.respond(STATUS, 200, &status(10, 100));
        let gate = transport.hold();
        let cancel = CancellationToken::new();

        let (handle, rx) = sampler(&transport).spawn(cancel.clone());
        while transport.call_count() == 0 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        gate.notify_one();
        handle.await.unwrap();

        assert_eq!(rx.borrow().samples, 0);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_consumer_is_gone() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();

        let (handle, rx) = sampler(&transport).spawn(cancel);
        drop(rx);

        handle.await.unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn sample_once_records_history() {
        let transport = MockTransport::new();
        transport.respond(STATUS, 200, &status(20, 1));
        transport.respond(STATUS, 200, &status(10, 2));
        transport.respond(STATUS, 200, &status(0, 3));
        let mut sampler = sampler(&transport);

        for _ in 0..3 {
            sampler.sample_once().await.unwrap();
        }

        assert_eq!(sampler.history().recent().collect::<Vec<_>>(), vec![20, 10, 0]);
        assert!(sampler.snapshot().tendency < 0.0);
    }
}
