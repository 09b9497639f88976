use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// A configuration that cannot be run. Reported before anything is dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("total request count must be at least 1")]
    ZeroRequests,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("no target url configured")]
    NoTarget,
}

/// Anything that kept a request from producing a response.
///
/// These never escape a [`crate::RequestExecutor`]; they are folded into a
/// transport-failure outcome.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("stats collector task failed: {0}")]
    Collector(#[from] tokio::task::JoinError),
}

/// Failure to read an auxiliary input file. Callers degrade to defaults.
#[derive(Debug, Error)]
#[error("failed to read {path}: {source}")]
pub struct InputError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure to emit a report. Fatal for the run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
