//! Transport abstraction: the wire layer the orchestrator drives.
//!
//! A transport executes one prepared request and translates every
//! lower-level failure into a [`TransportError`]. TLS verification,
//! redirect limits, and connection reuse live behind this boundary; the
//! orchestrator keeps no knowledge of transport internals.

pub mod plain;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::models::{Request, Response};

pub use plain::PlainTransport;

/// Boxed future type used by the dyn-compatible transport trait.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which transport backend executes a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// The built-in plain HTTP/2-capable backend.
    #[default]
    Plain,
    /// An injected TLS-fingerprinting backend.
    Stealth,
}

/// Preferred HTTP version, a hint the transport may ignore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpVersion {
    /// Negotiate via ALPN.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// Force HTTP/1.1.
    #[serde(rename = "1.1")]
    Http1,
    /// Force HTTP/2.
    #[serde(rename = "2")]
    Http2,
}

/// Per-call knobs the orchestrator resolves before handing a request to
/// the transport.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Total round-trip budget.
    pub timeout: Duration,
    /// Connection establishment budget.
    pub connect_timeout: Duration,
    /// Proxy URL to route through, when any.
    pub proxy: Option<String>,
    /// Verify TLS certificates.
    pub verify_tls: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Redirect ceiling when following.
    pub max_redirects: usize,
    /// HTTP version hint.
    pub http_version: HttpVersion,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            proxy: None,
            verify_tls: true,
            follow_redirects: true,
            max_redirects: 10,
            http_version: HttpVersion::Auto,
        }
    }
}

/// The contract between the orchestrator and a wire backend.
///
/// Implementations must populate `Response::elapsed` from the span they
/// measure (monotonic clock) and set `Response::url` to the final URL
/// after redirects.
pub trait Transport: Send + Sync {
    /// Execute one request.
    fn request<'a>(
        &'a self,
        request: &'a Request,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<Response, TransportError>>;

    /// Release pooled connections.
    fn close(&self) -> BoxFuture<'_, ()>;
}
