//! Blocking facade over the async client.
//!
//! Owns a private multi-thread runtime (`max_workers` threads) and drives
//! the async pipeline to completion on it. Both surfaces share one
//! client, so cookies, proxy health, and rate-limit state are common.
//!
//! Must not be used from inside an async runtime; use the async
//! [`Client`](crate::client::Client) there instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::client::Client as AsyncClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{BatchResult, Headers, Request, RequestBuilder, Response};
use crate::proxy::models::ProxyPoolStats;
use crate::transport::BackendKind;

/// Blocking HTTP client.
pub struct Client {
    inner: Arc<AsyncClient>,
    runtime: tokio::runtime::Runtime,
}

impl Client {
    /// Create a blocking client from a validated configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.max_workers())
            .enable_all()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build runtime: {e}")))?;
        let inner = Arc::new(AsyncClient::new(config)?);
        Ok(Self { inner, runtime })
    }

    /// Wrap an existing async client with a fresh runtime.
    pub fn from_async(inner: Arc<AsyncClient>) -> ClientResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(inner.config().max_workers())
            .enable_all()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    /// The shared async client.
    #[must_use]
    pub fn inner(&self) -> &Arc<AsyncClient> {
        &self.inner
    }

    /// Execute a request, blocking until it completes.
    pub fn execute(&self, request: Request) -> ClientResult<Response> {
        self.runtime.block_on(self.inner.execute(request))
    }

    /// Execute requests with bounded concurrency, blocking for the batch.
    pub fn gather(
        &self,
        requests: Vec<Request>,
        concurrency: Option<usize>,
        stop_on_error: bool,
    ) -> BatchResult {
        self.runtime
            .block_on(self.inner.gather(requests, concurrency, stop_on_error))
    }

    /// `gather` over plain URLs, issued as GET requests.
    pub fn gather_urls<I, S>(
        &self,
        urls: I,
        concurrency: Option<usize>,
        stop_on_error: bool,
    ) -> BatchResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime
            .block_on(self.inner.gather_urls(urls, concurrency, stop_on_error))
    }

    /// Build a request with an arbitrary method.
    #[must_use]
    pub fn request(&self, method: &str, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        BlockingRequestBuilder {
            client: self,
            builder: Request::builder(method, url),
        }
    }

    /// Build a GET request.
    #[must_use]
    pub fn get(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("GET", url)
    }

    /// Build a POST request.
    #[must_use]
    pub fn post(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("POST", url)
    }

    /// Build a PUT request.
    #[must_use]
    pub fn put(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("PUT", url)
    }

    /// Build a DELETE request.
    #[must_use]
    pub fn delete(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("DELETE", url)
    }

    /// Build a HEAD request.
    #[must_use]
    pub fn head(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("HEAD", url)
    }

    /// Build a PATCH request.
    #[must_use]
    pub fn patch(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("PATCH", url)
    }

    /// Build an OPTIONS request.
    #[must_use]
    pub fn options(&self, url: impl Into<String>) -> BlockingRequestBuilder<'_> {
        self.request("OPTIONS", url)
    }

    /// Status code of the last response.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        self.inner.last_status()
    }

    /// Cookies snapshot, domain -> name -> value.
    #[must_use]
    pub fn cookies(&self) -> HashMap<String, HashMap<String, String>> {
        self.inner.cookies()
    }

    /// Clear cookies for one domain, or everything.
    pub fn clear_cookies(&self, domain: Option<&str>) {
        self.inner.clear_cookies(domain);
    }

    /// Reset session state.
    pub fn reset_session(&self) {
        self.inner.reset_session();
    }

    /// Proxy pool statistics.
    #[must_use]
    pub fn proxy_stats(&self) -> ProxyPoolStats {
        self.inner.proxy_stats()
    }

    /// Release pooled transport connections.
    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}

/// A blocking request under construction.
#[must_use = "a request builder does nothing until sent"]
pub struct BlockingRequestBuilder<'a> {
    client: &'a Client,
    builder: RequestBuilder,
}

impl BlockingRequestBuilder<'_> {
    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Merge a set of headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.builder = self.builder.headers(headers);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Set a JSON body.
    pub fn json(mut self, value: Value) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Set a URL-encoded form body.
    pub fn form<N: Into<String>, V: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = (N, V)>,
    ) -> Self {
        self.builder = self.builder.form(fields);
        self
    }

    /// Set a raw byte body.
    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.builder = self.builder.body(bytes);
        self
    }

    /// Add a request-scoped cookie.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.cookie(name, value);
        self
    }

    /// Override the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.timeout(timeout);
        self
    }

    /// Route through a specific proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.builder = self.builder.proxy(url);
        self
    }

    /// Select the transport backend.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.builder = self.builder.backend(backend);
        self
    }

    /// Force stealth header composition on or off.
    pub fn stealth(mut self, enabled: bool) -> Self {
        self.builder = self.builder.stealth(enabled);
        self
    }

    /// Fail immediately instead of waiting for a rate-limit token.
    pub fn no_wait(mut self) -> Self {
        self.builder = self.builder.no_wait();
        self
    }

    /// Finish without sending.
    pub fn build(self) -> Request {
        self.builder.build()
    }

    /// Send the request, blocking until it completes.
    pub fn send(self) -> ClientResult<Response> {
        self.client.execute(self.builder.build())
    }
}
