//! scrapline: a scraping-grade HTTP client.
//!
//! Sits above a pluggable HTTP transport and adds the coordination,
//! safety, and resilience fabric scraping workloads need: per-domain
//! token-bucket rate limiting, a rotating proxy pool with health
//! tracking and cooldown recovery, an in-memory cookie jar with real
//! matching rules, status-code-aware retries with exponential backoff,
//! and browser-profile header composition for stealth requests.
//!
//! ```no_run
//! use scrapline::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), scrapline::ClientError> {
//!     let config = ClientConfig::builder()
//!         .rate_limit(2.0)
//!         .persist_cookies(true)
//!         .build()?;
//!     let client = Client::new(config)?;
//!
//!     let response = client.get("https://example.com").send().await?;
//!     println!("{} in {:?}", response.status, response.elapsed);
//!     Ok(())
//! }
//! ```
//!
//! A synchronous mirror of the API lives in [`blocking`].

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod proxy;
pub mod retry;
pub mod safety;
pub mod transport;
pub mod utils;

pub use client::{Client, ClientBuilder, ClientRequestBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, Mode};
pub use error::{ClientError, ClientResult, TransportError, TransportErrorKind};
pub use fingerprint::{get_profile, list_profiles, BrowserProfile, HeaderComposer};
pub use models::{BatchResult, Body, Headers, Request, RequestBuilder, Response};
pub use proxy::{
    ProxyConfig, ProxyFilter, ProxyHealth, ProxyManager, ProxyPool, ProxyPoolStats,
    ProxyProvider, ProxyScheme, ProxySnapshot, ProxyType, RotationStrategy, StaticProvider,
};
pub use retry::RetryPolicy;
pub use safety::{Cookie, CookieJar, DomainRateInfo, DomainRateLimiter, TokenBucket};
pub use transport::{BackendKind, HttpVersion, PlainTransport, Transport, TransportOptions};
