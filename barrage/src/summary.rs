use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{aggregate::AggregateStats, config::MeanPolicy, metric::StatusBucket, report::Report};

/// Final statistics of a run, derived once from the quiescent aggregate.
///
/// Latencies are whole milliseconds. Median and mean use integer arithmetic and
/// truncate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub attempted: u64,
    pub passed: u64,
    pub failed: u64,
    pub histogram: BTreeMap<StatusBucket, u64>,
    pub bytes_downloaded: u64,
    pub server_type: Option<String>,
    pub url_hits: BTreeMap<String, u64>,
    /// Latencies in the order they were recorded.
    pub latencies: Vec<u64>,
    pub sorted_latencies: Vec<u64>,
    pub min: u64,
    pub max: u64,
    pub median: u64,
    pub mean: u64,
    pub mean_policy: MeanPolicy,
}

impl Summary {
    pub fn compute(stats: AggregateStats, mean_policy: MeanPolicy) -> Self {
        let mut sorted_latencies = stats.latencies.clone();
        sorted_latencies.sort_unstable();

        let mean = match mean_policy {
            MeanPolicy::AllAttempts => mean(&sorted_latencies, sorted_latencies.len() as u64),
            // Passed attempts are the only ones with a non-zero latency.
            MeanPolicy::PassedOnly => mean(&sorted_latencies, stats.passed),
        };

        Self {
            attempted: stats.attempted,
            passed: stats.passed,
            failed: stats.failed,
            histogram: stats.histogram,
            bytes_downloaded: stats.bytes_downloaded,
            server_type: stats.server_type,
            url_hits: stats.url_hits,
            latencies: stats.latencies,
            min: sorted_latencies.first().copied().unwrap_or_default(),
            max: sorted_latencies.last().copied().unwrap_or_default(),
            median: median(&sorted_latencies),
            mean,
            sorted_latencies,
            mean_policy,
        }
    }

    pub fn kilobytes_downloaded(&self) -> f64 {
        self.bytes_downloaded as f64 / 1024.0
    }
}

impl From<AggregateStats> for Summary {
    fn from(stats: AggregateStats) -> Self {
        Self::compute(stats, MeanPolicy::default())
    }
}

impl Report<AggregateStats> for Summary {}

/// Median of an ascending slice, zero-based: the middle element for odd
/// lengths, the truncated average of the two middle elements otherwise.
pub fn median(sorted: &[u64]) -> u64 {
    let n = sorted.len();
    if n == 0 {
        return 0;
    }
    if n % 2 == 1 {
        sorted[(n - 1) / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2
    }
}

fn mean(latencies: &[u64], divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    let sum: u128 = latencies.iter().map(|&l| u128::from(l)).sum();
    (sum / u128::from(divisor)) as u64
}
