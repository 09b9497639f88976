use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{cookie::Cookie, error::ConfigError};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 barrage";

/// Which attempts the mean latency is taken over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeanPolicy {
    /// Every attempt, failures contributing zero. Failures pull the mean down.
    #[default]
    AllAttempts,
    /// Only attempts that passed.
    PassedOnly,
}

/// Everything a run needs. Read-only once the run starts.
///
/// ```rust
/// use std::time::Duration;
/// use barrage::LoadConfig;
///
/// let config = LoadConfig::builder()
///     .url("http://localhost:8080/health")
///     .concurrency(8)
///     .requests(200)
///     .delay(Duration::from_millis(50))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct LoadConfig {
    /// Target used when no url list is configured.
    #[builder(default, setter(into))]
    pub url: String,
    /// When non-empty, each request picks one of these uniformly at random.
    #[builder(default)]
    pub urls: Vec<String>,
    /// Method used when no POST data is configured.
    #[builder(default = Method::GET)]
    pub method: Method,
    #[builder(default = DEFAULT_USER_AGENT.to_owned(), setter(into))]
    pub user_agent: String,
    /// When non-empty, each request picks one of these uniformly at random.
    #[builder(default)]
    pub user_agents: Vec<String>,
    /// Static headers added to every request.
    #[builder(default)]
    pub headers: Vec<(String, String)>,
    /// Form fields. Presence forces a url-encoded POST.
    #[builder(default, setter(strip_option))]
    pub post_data: Option<Vec<(String, String)>>,
    #[builder(default)]
    pub cookies: Vec<Cookie>,
    /// Requests launched per batch.
    #[builder(default = 1)]
    pub concurrency: usize,
    /// Total requests for the run.
    #[builder(default = 1)]
    pub requests: usize,
    /// Pause between two batches.
    #[builder(default = Duration::ZERO)]
    pub delay: Duration,
    /// Deadline over a whole request, body included. `None` waits forever.
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,
    #[builder(default)]
    pub mean_policy: MeanPolicy,
}

impl LoadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests == 0 {
            return Err(ConfigError::ZeroRequests);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.url.is_empty() && self.urls.is_empty() {
            return Err(ConfigError::NoTarget);
        }
        Ok(())
    }

    /// POST when form fields are configured, the configured method otherwise.
    pub fn effective_method(&self) -> Method {
        if self.post_data.is_some() {
            Method::POST
        } else {
            self.method.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoadConfig::builder().url("http://a").build();
        assert_eq!(config.method, Method::GET);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.requests, 1);
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.timeout, None);
        assert_eq!(config.mean_policy, MeanPolicy::AllAttempts);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_counts() {
        let zero_requests = LoadConfig::builder().url("http://a").requests(0).build();
        assert_eq!(zero_requests.validate(), Err(ConfigError::ZeroRequests));

        let zero_concurrency = LoadConfig::builder().url("http://a").concurrency(0).build();
        assert_eq!(zero_concurrency.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn url_list_alone_is_a_target() {
        let no_target = LoadConfig::builder().build();
        assert_eq!(no_target.validate(), Err(ConfigError::NoTarget));

        let listed = LoadConfig::builder().urls(vec!["http://a".into()]).build();
        assert!(listed.validate().is_ok());
    }

    #[test]
    fn post_data_forces_post() {
        let config = LoadConfig::builder()
            .url("http://a")
            .method(Method::PUT)
            .post_data(vec![("k".into(), "v".into())])
            .build();
        assert_eq!(config.effective_method(), Method::POST);

        let plain = LoadConfig::builder().url("http://a").method(Method::PUT).build();
        assert_eq!(plain.effective_method(), Method::PUT);
    }
}
