//! Plain HTTP transport over reqwest.
//!
//! reqwest fixes proxy, TLS, and redirect policy at client construction,
//! so this transport keeps a small cache of clients keyed by the options
//! that vary per call. Connections are reused through those cached
//! clients.

use std::time::Instant;

use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use tracing::debug;

use super::{BoxFuture, HttpVersion, Transport, TransportOptions};
use crate::error::{TransportError, TransportErrorKind};
use crate::models::{Body, Headers, Request, Response};
use crate::safety::cookie_jar::Cookie;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    proxy: Option<String>,
    verify_tls: bool,
    // None = do not follow redirects.
    max_redirects: Option<usize>,
    http_version: HttpVersion,
    connect_timeout_ms: u128,
}

impl ClientKey {
    fn from_options(options: &TransportOptions) -> Self {
        Self {
            proxy: options.proxy.clone(),
            verify_tls: options.verify_tls,
            max_redirects: options.follow_redirects.then_some(options.max_redirects),
            http_version: options.http_version,
            connect_timeout_ms: options.connect_timeout.as_millis(),
        }
    }
}

/// The built-in reqwest-backed transport.
#[derive(Default)]
pub struct PlainTransport {
    clients: DashMap<ClientKey, reqwest::Client>,
}

impl PlainTransport {
    /// Create a transport with an empty client cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(
        &self,
        options: &TransportOptions,
        url: &str,
    ) -> Result<reqwest::Client, TransportError> {
        let key = ClientKey::from_options(options);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let policy = match key.max_redirects {
            Some(limit) => Policy::limited(limit),
            None => Policy::none(),
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .redirect(policy)
            .danger_accept_invalid_certs(!options.verify_tls);

        builder = match options.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        if let Some(proxy_url) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                TransportError::new(
                    TransportErrorKind::Connect,
                    url,
                    format!("unusable proxy configuration: {e}"),
                )
                .with_source(e)
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            TransportError::new(
                TransportErrorKind::Protocol,
                url,
                format!("failed to build HTTP client: {e}"),
            )
            .with_source(e)
        })?;

        debug!(proxy = ?options.proxy, "built transport client");
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    async fn execute(
        &self,
        request: &Request,
        options: &TransportOptions,
    ) -> Result<Response, TransportError> {
        let client = self.client_for(options, &request.url)?;

        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Protocol,
                &request.url,
                format!("invalid method '{}'", request.method),
            )
            .with_source(e)
        })?;

        let mut builder = client
            .request(method, &request.url)
            .timeout(options.timeout);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        builder = builder.headers(build_header_map(&request.headers, &request.url)?);

        if !request.cookies.is_empty() && !request.headers.contains("Cookie") {
            let cookie_line = request
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(reqwest::header::COOKIE, cookie_line);
        }

        match &request.body {
            Some(Body::Form(fields)) => builder = builder.form(fields),
            Some(Body::Json(value)) => builder = builder.json(value),
            Some(Body::Raw(bytes)) => builder = builder.body(bytes.clone()),
            Some(Body::Text(text)) => builder = builder.body(text.clone()),
            None => {}
        }

        let start = Instant::now();
        let raw = builder
            .send()
            .await
            .map_err(|e| classify(e, &request.url))?;

        let status = raw.status().as_u16();
        let final_url = raw.url().to_string();
        let final_host = raw.url().host_str().unwrap_or_default().to_lowercase();

        let mut headers = Headers::new();
        let mut cookies = Vec::new();
        for (name, value) in raw.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            if name == &reqwest::header::SET_COOKIE {
                // Malformed response cookies are skipped silently.
                if let Some(cookie) = Cookie::parse_set_cookie(value, &final_host) {
                    cookies.push(cookie);
                }
            }
            headers.insert(name.as_str(), value);
        }

        let body = raw
            .bytes()
            .await
            .map_err(|e| classify(e, &request.url))?
            .to_vec();
        let elapsed = start.elapsed();

        Ok(Response {
            status,
            headers,
            body,
            url: final_url,
            cookies,
            elapsed,
            request: Some(Box::new(request.clone())),
            history: Vec::new(),
        })
    }
}

impl Transport for PlainTransport {
    fn request<'a>(
        &'a self,
        request: &'a Request,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        Box::pin(self.execute(request, options))
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            // Dropping the cached clients releases their pools.
            self.clients.clear();
        })
    }
}

fn build_header_map(headers: &Headers, url: &str) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Protocol,
                url,
                format!("invalid header name '{name}'"),
            )
            .with_source(e)
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Protocol,
                url,
                format!("invalid value for header '{name}'"),
            )
            .with_source(e)
        })?;
        map.append(name, value);
    }
    Ok(map)
}

fn classify(error: reqwest::Error, url: &str) -> TransportError {
    let description = error.to_string();
    let lowered = description.to_lowercase();

    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if lowered.contains("dns") {
        TransportErrorKind::Dns
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("handshake")
    {
        TransportErrorKind::Tls
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Read
    } else if error.is_builder() || error.is_request() {
        TransportErrorKind::Protocol
    } else {
        TransportErrorKind::Read
    };

    TransportError::new(kind, url, description).with_source(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_distinguishes_proxy_and_redirects() {
        let base = TransportOptions::default();
        let mut with_proxy = TransportOptions::default();
        with_proxy.proxy = Some("http://p1:8080".to_string());
        let mut no_follow = TransportOptions::default();
        no_follow.follow_redirects = false;

        let a = ClientKey::from_options(&base);
        let b = ClientKey::from_options(&with_proxy);
        let c = ClientKey::from_options(&no_follow);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, ClientKey::from_options(&TransportOptions::default()));
    }

    #[test]
    fn header_map_rejects_invalid_names() {
        let mut headers = Headers::new();
        headers.insert("Bad Name", "x");
        assert!(build_header_map(&headers, "https://example.com").is_err());
    }
}
