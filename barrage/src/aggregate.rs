use std::{collections::BTreeMap, fmt::Debug};

use serde::{Serialize, de::DeserializeOwned};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    Metric,
    error::DriverError,
    macros::aggregate,
    metric::{RequestOutcome, StatusBucket},
};

/// The `Aggregate` trait defines how raw [`Metric`] values are folded into
/// running totals.
///
/// Aggregates keep the raw material a [`crate::Report`] needs (counters,
/// histograms, recorded samples) and do **not** compute final statistics such
/// as medians or means. Those belong in the report, which is derived once the
/// run is over.
///
/// # Example
/// ```rust
/// use barrage::{Aggregate, macros::*};
///
/// #[metric]
/// struct Hit(u64);
///
/// #[aggregate]
/// struct Hits {
///     count: u64,
///     sum: u64,
/// }
///
/// impl Aggregate for Hits {
///     type Metric = Hit;
///
///     fn new() -> Self {
///         Self { count: 0, sum: 0 }
///     }
///
///     fn consume(&mut self, metric: &Self::Metric) {
///         self.count += 1;
///         self.sum += metric.0;
///     }
/// }
/// ```
pub trait Aggregate
where
    Self: Serialize + DeserializeOwned + PartialOrd + PartialEq + Send + Sync + Debug + Clone,
{
    /// The metric type this aggregate summarizes.
    type Metric: Metric;

    /// Create a new, empty instance of the aggregate.
    fn new() -> Self;

    /// Aggregate multiple metrics into the current instance.
    fn aggregate(&mut self, metrics: &[Self::Metric]) {
        metrics.iter().for_each(|m| self.consume(m));
    }

    /// Incorporate a single metric into the aggregate.
    fn consume(&mut self, metric: &Self::Metric);
}

/// Running totals of a load run.
///
/// Holds `passed + failed == attempted`, `sum(histogram) == attempted` and
/// `latencies.len() == attempted` after every [`Aggregate::consume`].
#[aggregate]
#[derive(Default)]
pub struct AggregateStats {
    pub attempted: u64,
    pub passed: u64,
    pub failed: u64,
    pub histogram: BTreeMap<StatusBucket, u64>,
    /// One entry per attempt in recording order, zero for failures.
    pub latencies: Vec<u64>,
    pub bytes_downloaded: u64,
    /// Last observed `Server` header.
    pub server_type: Option<String>,
    pub url_hits: BTreeMap<String, u64>,
}

impl Aggregate for AggregateStats {
    type Metric = RequestOutcome;

    fn new() -> Self {
        AggregateStats::default()
    }

    fn consume(&mut self, metric: &Self::Metric) {
        self.attempted += 1;
        if metric.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        *self.histogram.entry(metric.bucket).or_default() += 1;
        self.latencies.push(metric.latency_ms);
        self.bytes_downloaded += metric.bytes;
        if let Some(server) = &metric.server {
            self.server_type = Some(server.clone());
        }
        *self.url_hits.entry(metric.url.clone()).or_default() += 1;
    }
}

/// Upper bound on the collector's channel, whatever the run's concurrency.
pub const MAX_COLLECTOR_BUFFER: usize = 4096;

/// Collector task: the only writer of the aggregate.
///
/// Drains whatever is queued after each wakeup and folds it in one go. Ends
/// once every sender has been dropped.
async fn aggregator_task<A: Aggregate>(
    mut rx: mpsc::Receiver<A::Metric>,
    batch_size: usize,
) -> A {
    let mut agg = A::new();
    let mut batch = Vec::new();

    while let Some(metric) = rx.recv().await {
        batch.push(metric);
        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(metric) => batch.push(metric),
                Err(_) => break,
            }
        }
        agg.aggregate(&batch);
        batch.clear();
    }
    agg
}

/// Owner of the collector task for one run.
///
/// Executors report through cloned [`StatsRecorder`]s. The aggregate can only
/// be read through [`StatsAggregator::snapshot`], which consumes the
/// aggregator and waits for the collector to drain.
pub struct StatsAggregator<A: Aggregate = AggregateStats> {
    tx: mpsc::Sender<A::Metric>,
    collector: JoinHandle<A>,
}

impl<A: Aggregate + 'static> StatsAggregator<A> {
    /// Spawns the collector. `buffer` bounds the number of in-flight metrics
    /// and is clamped to `1..=MAX_COLLECTOR_BUFFER`.
    pub fn spawn(buffer: usize) -> Self {
        let buffer = buffer.clamp(1, MAX_COLLECTOR_BUFFER);
        let (tx, rx) = mpsc::channel(buffer);
        let collector = tokio::spawn(aggregator_task::<A>(rx, buffer));
        Self { tx, collector }
    }

    pub fn recorder(&self) -> StatsRecorder<A> {
        StatsRecorder {
            tx: self.tx.clone(),
        }
    }

    /// Closes the aggregator and returns the final aggregate.
    ///
    /// Only returns once every outstanding [`StatsRecorder`] is gone, so it must
    /// be called after all writers have finished.
    pub async fn snapshot(self) -> Result<A, DriverError> {
        drop(self.tx);
        Ok(self.collector.await?)
    }
}

/// Cheap, cloneable handle used by executors to report metrics.
pub struct StatsRecorder<A: Aggregate = AggregateStats> {
    tx: mpsc::Sender<A::Metric>,
}

impl<A: Aggregate> Clone for StatsRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Aggregate> StatsRecorder<A> {
    pub async fn record(&self, metric: A::Metric) {
        if self.tx.send(metric).await.is_err() {
            tracing::error!("Stats collector is gone, dropping a metric");
        }
    }
}
