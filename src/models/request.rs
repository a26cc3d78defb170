//! HTTP request representation.

use std::time::Duration;

use serde_json::Value;

use super::headers::Headers;
use crate::transport::BackendKind;

/// Request body payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// URL-encoded form fields.
    Form(Vec<(String, String)>),
    /// JSON document.
    Json(Value),
    /// Raw bytes, sent as-is.
    Raw(Vec<u8>),
    /// Plain text.
    Text(String),
}

/// An HTTP request, immutable once built.
///
/// The client never mutates a caller's request; orchestration produces a
/// prepared copy with merged headers and cookies.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method, normalized to uppercase.
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Caller-supplied headers (win over client defaults and profile
    /// headers on conflict).
    pub headers: Headers,
    /// Query parameters appended to the URL.
    pub params: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<Body>,
    /// Request-scoped cookies (win over jar cookies on name conflict).
    pub cookies: Vec<(String, String)>,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
    /// Per-request proxy override (used when no pool is configured).
    pub proxy: Option<String>,
    /// Per-request transport backend selector.
    pub backend: Option<BackendKind>,
    /// Per-request stealth override; `None` follows the client mode.
    pub stealth: Option<bool>,
    /// When false, a missing rate-limit token fails immediately instead of
    /// waiting.
    pub wait_for_rate_limit: bool,
}

impl Request {
    /// Create a request with the given method and URL.
    #[must_use]
    pub fn new(method: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            url: url.into(),
            headers: Headers::new(),
            params: Vec::new(),
            body: None,
            cookies: Vec::new(),
            timeout: None,
            proxy: None,
            backend: None,
            stealth: None,
            wait_for_rate_limit: true,
        }
    }

    /// Start a fluent builder.
    #[must_use]
    pub fn builder(method: impl AsRef<str>, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            request: Self::new(method, url),
        }
    }

    /// Shorthand for a GET request to `url`.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }
}

/// Fluent builder over [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    /// Merge a set of headers; later calls win on conflict.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.request.headers.extend(&headers);
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.params.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body.
    #[must_use]
    pub fn json(mut self, value: Value) -> Self {
        self.request.body = Some(Body::Json(value));
        self
    }

    /// Set a URL-encoded form body.
    #[must_use]
    pub fn form<N: Into<String>, V: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = (N, V)>,
    ) -> Self {
        self.request.body = Some(Body::Form(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        ));
        self
    }

    /// Set a raw byte body.
    #[must_use]
    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.request.body = Some(Body::Raw(bytes.into()));
        self
    }

    /// Set a plain-text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.request.body = Some(Body::Text(text.into()));
        self
    }

    /// Add a request-scoped cookie.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.cookies.push((name.into(), value.into()));
        self
    }

    /// Override the timeout for this request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Route this request through a specific proxy.
    #[must_use]
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.request.proxy = Some(url.into());
        self
    }

    /// Select the transport backend for this request.
    #[must_use]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.request.backend = Some(backend);
        self
    }

    /// Force stealth header composition on or off for this request.
    #[must_use]
    pub fn stealth(mut self, enabled: bool) -> Self {
        self.request.stealth = Some(enabled);
        self
    }

    /// Fail with `RateLimitExceeded` instead of waiting for a token.
    #[must_use]
    pub fn no_wait(mut self) -> Self {
        self.request.wait_for_rate_limit = false;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_is_normalized_uppercase() {
        let request = Request::new("post", "https://example.com");
        assert_eq!(request.method, "POST");
    }

    #[test]
    fn builder_collects_parts() {
        let request = Request::builder("get", "https://example.com")
            .header("X-A", "1")
            .query("q", "rust")
            .cookie("sid", "abc")
            .no_wait()
            .build();

        assert_eq!(request.method, "GET");
        assert_eq!(request.headers.get("x-a"), Some("1"));
        assert_eq!(request.params, vec![("q".to_string(), "rust".to_string())]);
        assert!(!request.wait_for_rate_limit);
    }
}
