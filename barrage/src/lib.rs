//! Barrage, a small HTTP load generator.
//!
//! Barrage fires a fixed number of HTTP requests at one or more target URLs,
//! a batch at a time, measures each round trip and reduces the results into a
//! summary: pass/fail counts, a status histogram, bytes downloaded and
//! min/median/mean/max latency.
//!
//! # Architecture
//!
//! The pipeline follows the metric → aggregate → report split:
//!
//! - [`RequestExecutor`]: performs one request through a [`Transport`] and turns
//!   whatever happened into a [`RequestOutcome`]. It never fails.
//! - [`Metric`]: the smallest unit produced by a request. [`RequestOutcome`] is
//!   the built-in metric.
//! - [`Aggregate`]: folds metrics into running totals. [`AggregateStats`] is fed
//!   by a single collector task owned by a [`StatsAggregator`], so executors never
//!   touch shared state directly.
//! - [`LoadDriver`]: dispatches batches of executors, waits for every one of them
//!   and finalizes the run.
//! - [`Report`]: a pure derivation from an aggregate. [`Summary`] sorts the
//!   latencies and computes the statistics.
//! - [`Reporter`]: the I/O boundary. Console, JSON and file reporters are provided.
//!
//! # Example
//!
//! ```rust,no_run
//! use barrage::{ConsoleReporter, LoadConfig, LoadDriver, Reporter, ReqwestTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LoadConfig::builder()
//!         .url("http://localhost:3000")
//!         .concurrency(10)
//!         .requests(100)
//!         .build();
//!
//!     let summary = LoadDriver::new(config, ReqwestTransport::new()?)
//!         .run()
//!         .await?;
//!     ConsoleReporter.report(&summary).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Feature flags
//! - `internals`: exposes unstable driver building blocks such as progress tracking.

extern crate self as barrage;

/// Outcome accumulation
pub mod aggregate;
/// Run configuration
pub mod config;
/// Cookies attached to every request
pub mod cookie;
/// Batch dispatch and run lifecycle
pub mod driver;
/// Error types
pub mod error;
/// Auxiliary input file loaders
pub mod input;
/// Single request outcomes
pub mod metric;
/// Reports and reporters
pub mod report;
/// One request/response cycle
pub mod request;
/// Derived run statistics
pub mod summary;
/// The HTTP seam
pub mod transport;

pub use aggregate::{Aggregate, AggregateStats, StatsAggregator, StatsRecorder};
pub use config::{LoadConfig, MeanPolicy};
pub use cookie::Cookie;
pub use driver::{DriverState, LoadDriver};
pub use error::{ConfigError, DriverError, InputError, ReportError, TransportError};
pub use metric::{Metric, RequestOutcome, StatusBucket};
pub use report::{ConsoleReporter, FileReporter, JsonReporter, Report, Reporter};
pub use request::{PreparedRequest, RequestExecutor};
pub use summary::Summary;
pub use transport::{ReqwestTransport, Transport, TransportResponse};

/// Procedural macros to reduce boilerplate
pub mod macros {
    pub use barrage_macros::*;
}
