use std::future::Future;

use reqwest::{Client, header};

use crate::{error::TransportError, request::PreparedRequest};

/// The HTTP seam of an executor.
///
/// A transport sends one fully prepared request and hands back the response
/// head. The body is only read on demand through
/// [`TransportResponse::body_len`], so executors can skip it for responses they
/// do not count.
///
/// Implementations are shared by every executor of a run.
pub trait Transport: Send + Sync + 'static {
    type Response: TransportResponse;

    fn send(
        &self,
        request: PreparedRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send;
}

/// A response whose head has been received.
pub trait TransportResponse: Send + 'static {
    fn status_code(&self) -> u16;

    /// The `Server` response header, if present and valid UTF-8.
    fn server_header(&self) -> Option<String>;

    /// Reads the full body and returns its length in bytes.
    fn body_len(self) -> impl Future<Output = Result<u64, TransportError>> + Send;
}

/// Production transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    type Response = reqwest::Response;

    async fn send(&self, request: PreparedRequest) -> Result<Self::Response, TransportError> {
        let cookie = request.cookie_header();
        let mut builder = self.client.request(request.method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        Ok(builder.send().await?)
    }
}

impl TransportResponse for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn server_header(&self) -> Option<String> {
        self.headers()
            .get(header::SERVER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    async fn body_len(self) -> Result<u64, TransportError> {
        Ok(self.bytes().await?.len() as u64)
    }
}
