use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::macros::metric;

/// A `Metric` is a single observation produced by one request.
///
/// Metrics are folded into an [`crate::Aggregate`] and later turned into a
/// [`crate::Report`]. They must be cheap to clone and safe to send between the
/// executor tasks and the collector task.
///
/// The `#[metric]` attribute derives everything required and implements the
/// trait:
///
/// ```rust
/// use barrage::macros::metric;
///
/// #[metric]
/// struct Ping {
///     rtt_ms: u64,
/// }
/// ```
pub trait Metric
where
    Self: Serialize + DeserializeOwned + PartialOrd + PartialEq + Send + Sync + Debug + Clone,
{
}

/// Coarse classification of a response by its status hundred-range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StatusBucket {
    #[serde(rename = "2xx")]
    Success,
    #[serde(rename = "3xx")]
    Redirection,
    #[serde(rename = "4xx")]
    ClientError,
    #[serde(rename = "5xx")]
    ServerError,
    /// No response was obtained at all.
    #[serde(rename = "transport-failure")]
    TransportFailure,
}

impl StatusBucket {
    /// Buckets a status code. Codes below 300 land in `2xx`; a client never
    /// surfaces a 1xx as a final response.
    pub fn from_status(status: u16) -> Self {
        match status {
            0..=299 => Self::Success,
            300..=399 => Self::Redirection,
            400..=499 => Self::ClientError,
            _ => Self::ServerError,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "2xx",
            Self::Redirection => "3xx",
            Self::ClientError => "4xx",
            Self::ServerError => "5xx",
            Self::TransportFailure => "transport-failure",
        }
    }
}

impl fmt::Display for StatusBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// The recorded result of one HTTP attempt.
///
/// Only a status of exactly 200 counts as passed. Every other response,
/// including the rest of the 2xx range, is bucketed by its status but recorded
/// as failed with a latency of zero.
#[metric]
pub struct RequestOutcome {
    pub url: String,
    pub latency_ms: u64,
    pub bucket: StatusBucket,
    pub status: Option<u16>,
    pub passed: bool,
    pub bytes: u64,
    pub server: Option<String>,
}

impl RequestOutcome {
    /// A 200 response with its measured latency and body length.
    pub fn passed(
        url: impl Into<String>,
        latency_ms: u64,
        bytes: u64,
        server: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            latency_ms,
            bucket: StatusBucket::Success,
            status: Some(200),
            passed: true,
            bytes,
            server,
        }
    }

    /// Any response other than 200.
    pub fn rejected(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            latency_ms: 0,
            bucket: StatusBucket::from_status(status),
            status: Some(status),
            passed: false,
            bytes: 0,
            server: None,
        }
    }

    /// The request never produced a response.
    pub fn transport_failure(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            latency_ms: 0,
            bucket: StatusBucket::TransportFailure,
            status: None,
            passed: false,
            bytes: 0,
            server: None,
        }
    }
}
