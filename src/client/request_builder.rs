//! Request builder bound to a client.

use std::time::Duration;

use serde_json::Value;

use crate::error::ClientResult;
use crate::models::{Headers, Request, RequestBuilder, Response};
use crate::transport::BackendKind;

use super::core::Client;

/// A request under construction, sent with [`send`](Self::send).
#[must_use = "a request builder does nothing until sent"]
pub struct ClientRequestBuilder<'a> {
    client: &'a Client,
    builder: RequestBuilder,
}

impl<'a> ClientRequestBuilder<'a> {
    pub(crate) fn new(client: &'a Client, builder: RequestBuilder) -> Self {
        Self { client, builder }
    }

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

    /// Set a plain-text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.builder = self.builder.text(text);
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

    /// Route through a specific proxy (used when no pool is configured).
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

    /// Finish without sending (for `gather` input lists).
    pub fn build(self) -> Request {
        self.builder.build()
    }

    /// Send the request through the client pipeline.
    pub async fn send(self) -> ClientResult<Response> {
        let request = self.builder.build();
        self.client.execute(request).await
    }
}
