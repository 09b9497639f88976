use std::{future::Future, sync::Arc};

use rand::{Rng, seq::IndexedRandom};
use reqwest::Method;
use tokio::time::Instant;

use crate::{
    aggregate::StatsRecorder,
    config::LoadConfig,
    cookie::Cookie,
    error::TransportError,
    metric::RequestOutcome,
    transport::{Transport, TransportResponse},
};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request with every header, cookie and body decided, ready for a
/// [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub cookies: Vec<Cookie>,
}

impl PreparedRequest {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `Cookie` header value carrying every cookie, if there are any.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self.cookies.iter().map(Cookie::pair).collect();
        Some(pairs.join("; "))
    }
}

/// Performs one request/response cycle and classifies it.
///
/// Executing never fails: connection errors, timeouts and unwanted statuses
/// all end up as a [`RequestOutcome`].
pub struct RequestExecutor<T> {
    config: Arc<LoadConfig>,
    transport: Arc<T>,
}

impl<T> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(config: Arc<LoadConfig>, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    pub fn prepare(&self, url: &str) -> PreparedRequest {
        self.prepare_with(url, &mut rand::rng())
    }

    /// Builds the request for `url`, picking the user agent with `rng`.
    pub fn prepare_with<R: Rng + ?Sized>(&self, url: &str, rng: &mut R) -> PreparedRequest {
        let config = &self.config;
        let user_agent = config
            .user_agents
            .choose(rng)
            .unwrap_or(&config.user_agent)
            .clone();

        let mut headers = Vec::with_capacity(config.headers.len() + 2);
        headers.push(("User-Agent".to_owned(), user_agent));
        headers.extend(config.headers.iter().cloned());

        let body = config.post_data.as_ref().map(|fields| {
            url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish()
        });
        if body.is_some() {
            headers.push(("Content-Type".to_owned(), FORM_CONTENT_TYPE.to_owned()));
        }

        PreparedRequest {
            method: config.effective_method(),
            url: url.to_owned(),
            headers,
            body,
            cookies: config.cookies.clone(),
        }
    }

    /// Runs `fut` under the configured per-request deadline, if any.
    async fn with_deadline<F, O>(&self, fut: F) -> Result<O, TransportError>
    where
        F: Future<Output = Result<O, TransportError>>,
    {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => fut.await,
        }
    }

    /// Performs exactly one request against `url`.
    ///
    /// The deadline covers sending, the response head and the body read.
    /// Expiry at any of these stages is a transport failure.
    pub async fn execute(&self, url: &str) -> RequestOutcome {
        let request = self.prepare(url);
        match self.with_deadline(self.exchange(url, request)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!("Request to {url} failed: {e}");
                RequestOutcome::transport_failure(url)
            }
        }
    }

    async fn exchange(
        &self,
        url: &str,
        request: PreparedRequest,
    ) -> Result<RequestOutcome, TransportError> {
        let start = Instant::now();
        let response = self.transport.send(request).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let status = response.status_code();
        if status != 200 {
            tracing::debug!("Request to {url} answered {status}");
            return Ok(RequestOutcome::rejected(url, status));
        }

        let server = response.server_header();
        let bytes = match response.body_len().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read response body from {url}: {e}");
                0
            }
        };
        Ok(RequestOutcome::passed(url, latency_ms, bytes, server))
    }

    /// Performs one request and reports its outcome.
    pub async fn run(&self, url: &str, recorder: &StatsRecorder) {
        let outcome = self.execute(url).await;
        recorder.record(outcome).await;
    }
}
