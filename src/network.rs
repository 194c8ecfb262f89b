//! Network access behind a trait so the worker can be driven by a fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::http::{Request, RequestMode, Response, ResponseType};

/// Performs a request against the network.
///
/// An `Err` means the request never produced a response (offline, DNS,
/// connection refused, timeout). HTTP error statuses are returned as `Ok`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Sends `request` and returns the response snapshot.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        (**self).fetch(request).await
    }
}

/// Classifies the response a browser would hand back for `request`.
///
/// Returns `None` when the request is not allowed to leave at all.
fn response_type(origin: &str, request: &Request) -> Option<ResponseType> {
    if request.origin() == origin {
        return Some(ResponseType::Basic);
    }
    match request.mode {
        RequestMode::SameOrigin => None,
        RequestMode::Cors => Some(ResponseType::Cors),
        RequestMode::NoCors | RequestMode::Navigate => Some(ResponseType::Opaque),
    }
}

/// [`Fetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: String,
}

impl HttpFetcher {
    /// Creates a fetcher for pages served from `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(origin: &Url, config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(Self::with_client(builder.build()?, origin))
    }

    /// Creates a fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, origin: &Url) -> Self {
        Self {
            client,
            origin: origin.origin().ascii_serialization(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let Some(kind) = response_type(&self.origin, request) else {
            return Err(Error::Network(format!(
                "same-origin request to cross-origin URL {}",
                request.url
            )));
        };
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::Network(format!("invalid method {}: {e}", request.method)))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        log::debug!("{} {}", request.method, request.url);
        let resp = builder.send().await?;

        if kind == ResponseType::Opaque {
            return Ok(Response::opaque());
        }

        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = resp.bytes().await?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            kind,
        })
    }
}
