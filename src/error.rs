//! Error types for client operations.
//!
//! The taxonomy separates transport-level failures (connection, DNS, TLS,
//! timeout) from HTTP-level outcomes: a non-2xx response is data, not an
//! error, until the caller explicitly asks for one via
//! [`Response::error_for_status`](crate::models::Response::error_for_status).

use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established (refused, unreachable, proxy).
    Connect,
    /// Name resolution failed.
    Dns,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// The request exceeded its time budget.
    Timeout,
    /// The connection dropped or the body could not be read.
    Read,
    /// Malformed request or protocol-level failure.
    Protocol,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Dns => "dns",
            Self::Tls => "tls",
            Self::Timeout => "timeout",
            Self::Read => "read",
            Self::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// A failure below the HTTP layer, carrying the original cause.
#[derive(Debug, Error)]
#[error("transport {kind} error for {url}: {message}")]
pub struct TransportError {
    /// What went wrong, structurally.
    pub kind: TransportErrorKind,
    /// The URL the request was addressed to.
    pub url: String,
    /// Human-readable description.
    pub message: String,
    /// The underlying I/O or protocol error, when available.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Build a transport error without an underlying cause.
    #[must_use]
    pub fn new(kind: TransportErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Error type for all client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A failure below the HTTP layer (connection, DNS, TLS, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A non-2xx response, surfaced only through an explicit
    /// `error_for_status` call.
    #[error("HTTP {status} for {url}")]
    Http {
        /// Response status code.
        status: u16,
        /// Final URL of the response.
        url: String,
    },

    /// Rate limit token unavailable in non-blocking acquire mode.
    #[error("rate limit exceeded for {domain}")]
    RateLimitExceeded {
        /// The domain whose bucket was empty.
        domain: String,
        /// Suggested wait before the next attempt, when computable.
        retry_after: Option<Duration>,
    },

    /// All retry attempts consumed. Carries the final cause.
    #[error("max retries ({attempts}) exceeded for {url}")]
    MaxRetriesExceeded {
        /// The request URL.
        url: String,
        /// Total attempts made (retries + 1).
        attempts: u32,
        /// The error observed on the final attempt.
        #[source]
        source: Option<Box<ClientError>>,
    },

    /// The pool has entries but none are currently usable.
    #[error("no healthy proxies available")]
    NoHealthyProxies,

    /// Every proxy in the pool has been disabled by failures.
    #[error("all proxies in pool have failed")]
    AllProxiesFailed,

    /// A proxy URL or its credentials could not be parsed at setup.
    #[error("invalid proxy URL '{url}': {reason}")]
    ProxyConfiguration {
        /// The offending URL, password masked.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The requested proxy provider is not registered.
    #[error("proxy provider not found: {0}")]
    ProviderNotFound(String),

    /// An unknown browser profile name.
    #[error("unknown browser profile '{name}'; available: {available}")]
    UnknownProfile {
        /// The requested name.
        name: String,
        /// Comma-separated catalog names.
        available: String,
    },

    /// Invalid construction-time configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether this error should count against proxy health.
    ///
    /// Only transport failures and transport-caused retry exhaustion count;
    /// HTTP-level statuses never do.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::MaxRetriesExceeded { source, .. } => source
                .as_deref()
                .is_some_and(|cause| matches!(cause, Self::Transport(_))),
            _ => false,
        }
    }
}
