//! LoadDriver: batch dispatch and the lifecycle of a run
//!
//! A run moves through `Idle → Dispatching → Draining → Finalized`:
//!
//! 1. **Idle**: the configuration is validated. A bad configuration fails here,
//!    before anything is sent.
//! 2. **Dispatching**: while requests remain, a batch of
//!    `min(concurrency, remaining)` executor tasks is spawned, newly crossed
//!    progress milestones are announced, and the driver sleeps the inter-batch
//!    delay if another batch follows. The driver never waits for a batch to
//!    finish, so batches may overlap; the delay only controls the dispatch rate.
//! 3. **Draining**: the driver joins every task it spawned. This is the
//!    completion barrier: it releases only once all `requests` tasks have
//!    reported. A task that panicked is recorded as a transport failure so the
//!    counters still add up.
//! 4. **Finalized**: the collector is closed and the aggregate becomes a
//!    [`Summary`].
//!
//! Executors report through a [`StatsRecorder`] into a single collector task,
//! so the aggregate is never written concurrently.
mod progress;

use std::sync::Arc;

use futures::future::join_all;
use rand::seq::IndexedRandom;
use tokio::task::JoinHandle;

use crate::{
    aggregate::{AggregateStats, StatsAggregator, StatsRecorder},
    config::LoadConfig,
    error::DriverError,
    metric::RequestOutcome,
    request::RequestExecutor,
    summary::Summary,
    transport::Transport,
};
use progress::*;

#[cfg(feature = "internals")]
pub use progress::*;

/// Where a [`LoadDriver`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Dispatching,
    Draining,
    Finalized,
}

/// Dispatches the requests of a run in batches and waits for all of them.
pub struct LoadDriver<T: Transport> {
    config: Arc<LoadConfig>,
    transport: Arc<T>,
    state: DriverState,
}

/// A spawned request and the url it targets.
struct InFlight {
    url: String,
    handle: JoinHandle<()>,
}

impl<T: Transport> LoadDriver<T> {
    pub fn new(config: LoadConfig, transport: T) -> Self {
        Self::from_shared(Arc::new(config), Arc::new(transport))
    }

    pub fn from_shared(config: Arc<LoadConfig>, transport: Arc<T>) -> Self {
        Self {
            config,
            transport,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    fn transition(&mut self, next: DriverState) {
        tracing::debug!("Driver {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// A url from the configured list, or the fixed url.
    fn pick_url(&self) -> String {
        self.config
            .urls
            .choose(&mut rand::rng())
            .unwrap_or(&self.config.url)
            .clone()
    }

    /// Runs every configured request and returns the summary of the run.
    ///
    /// Request failures never fail the run; only an invalid configuration or a
    /// crashed collector does. Each call is an independent run.
    pub async fn run(&mut self) -> Result<Summary, DriverError> {
        self.state = DriverState::Idle;
        self.config.validate()?;

        let total = self.config.requests;
        let concurrency = self.config.concurrency;
        let executor = RequestExecutor::new(Arc::clone(&self.config), Arc::clone(&self.transport));
        let aggregator =
            StatsAggregator::<AggregateStats>::spawn(concurrency.min(total).saturating_mul(10));
        let recorder = aggregator.recorder();

        self.transition(DriverState::Dispatching);
        tracing::info!("Dispatching {total} requests, {concurrency} at a time");
        let in_flight = self.dispatch(&executor, &recorder).await;

        self.transition(DriverState::Draining);
        tracing::info!("All requests dispatched, waiting for {} to complete", in_flight.len());
        let completed = drain(in_flight, &recorder).await;
        tracing::info!("{completed}/{total} requests completed");
        drop(recorder);

        let stats = aggregator.snapshot().await?;
        if stats.attempted != total as u64 {
            tracing::error!(
                "Recorded {} outcomes for {total} dispatched requests",
                stats.attempted
            );
        }
        self.transition(DriverState::Finalized);
        Ok(Summary::compute(stats, self.config.mean_policy))
    }

    async fn dispatch(
        &self,
        executor: &RequestExecutor<T>,
        recorder: &StatsRecorder,
    ) -> Vec<InFlight> {
        let total = self.config.requests;
        let mut progress = Progress::new(total);
        let mut remaining = total;
        let mut in_flight = Vec::with_capacity(total);

        while remaining > 0 {
            let batch = self.config.concurrency.min(remaining);
            for _ in 0..batch {
                in_flight.push(spawn_request(
                    executor.clone(),
                    recorder.clone(),
                    self.pick_url(),
                ));
            }
            remaining -= batch;

            let dispatched = total - remaining;
            for milestone in progress.advance(dispatched) {
                tracing::info!("{milestone}% dispatched ({dispatched}/{total})");
            }

            if remaining > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }
        tracing::debug!(
            "Announced milestones: {:?}",
            progress.announced().collect::<Vec<_>>()
        );
        in_flight
    }
}

fn spawn_request<T: Transport>(
    executor: RequestExecutor<T>,
    recorder: StatsRecorder,
    url: String,
) -> InFlight {
    let target = url.clone();
    let handle = tokio::spawn(async move {
        executor.run(&target, &recorder).await;
    });
    InFlight { url, handle }
}

/// Joins every in-flight request. Returns the number of completions.
async fn drain(in_flight: Vec<InFlight>, recorder: &StatsRecorder) -> usize {
    let (urls, handles): (Vec<String>, Vec<JoinHandle<()>>) = in_flight
        .into_iter()
        .map(|flight| (flight.url, flight.handle))
        .unzip();

    let mut completed = 0;
    for (url, result) in urls.into_iter().zip(join_all(handles).await) {
        if let Err(e) = result {
            tracing::error!("Request task for {url} panicked: {e}");
            recorder.record(RequestOutcome::transport_failure(url)).await;
        }
        completed += 1;
    }
    completed
}
