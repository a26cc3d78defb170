//! Single-request orchestration.
//!
//! Each call walks the same ordered pipeline: stealth delay, rate-limit
//! acquisition, header preparation, cookie merge, proxy pick, retried
//! execution, proxy health report, jar update, and last-response
//! bookkeeping. Health reports and jar writes are fire-and-forget: they
//! never fail the request path.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::request_builder::ClientRequestBuilder;
use crate::config::Mode;
use crate::error::{ClientError, ClientResult};
use crate::models::{Headers, Request, Response};
use crate::transport::TransportOptions;
use crate::utils::extract_domain;

use super::core::Client;

impl Client {
    /// Execute a request through the full pipeline.
    pub async fn execute(&self, request: Request) -> ClientResult<Response> {
        // 1. Stealth delay.
        if self.is_stealth() {
            let delay = self.draw_delay();
            if !delay.is_zero() {
                debug!(delay_ms = delay.as_millis() as u64, "stealth delay");
                tokio::time::sleep(delay).await;
            }
        }

        // 2. Rate limit acquisition.
        if let Some(limiter) = &self.rate_limiter {
            let acquired = limiter
                .acquire(&request.url, request.wait_for_rate_limit)
                .await;
            if !acquired {
                let domain = extract_domain(&request.url).unwrap_or_default();
                return Err(ClientError::RateLimitExceeded {
                    retry_after: limiter.retry_after(&request.url),
                    domain,
                });
            }
        }

        // 3 + 4. Header preparation and cookie merge.
        let prepared = self.prepare_request(&request);

        // 5..9. Proxy pick, retried execution, reports, jar update.
        self.execute_prepared(prepared).await
    }

    /// Produce the prepared copy: composed/minimal headers with client
    /// defaults merged under caller headers, and jar cookies merged under
    /// request cookies.
    fn prepare_request(&self, request: &Request) -> Request {
        let stealth = request.stealth.unwrap_or(self.config.mode == Mode::Stealth);

        // Client defaults first, caller wins on conflict.
        let mut caller_headers = self.default_headers.read().clone();
        caller_headers.extend(&request.headers);

        let headers = if stealth {
            self.composer
                .compose(&request.url, &request.method, &caller_headers)
        } else {
            let mut headers: Headers = caller_headers;
            if !headers.contains("User-Agent") {
                headers.insert(
                    "User-Agent",
                    concat!("scrapline/", env!("CARGO_PKG_VERSION")),
                );
            }
            headers
        };

        // Jar cookies first, request cookies win on name conflict.
        let mut cookies: Vec<(String, String)> = self
            .jar
            .as_ref()
            .map(|jar| jar.get_for_url(&request.url))
            .unwrap_or_default();
        for (name, value) in &request.cookies {
            match cookies.iter_mut().find(|(existing, _)| existing == name) {
                Some(entry) => entry.1 = value.clone(),
                None => cookies.push((name.clone(), value.clone())),
            }
        }

        Request {
            headers,
            cookies,
            ..request.clone()
        }
    }

    fn transport_options(&self, request: &Request) -> TransportOptions {
        TransportOptions {
            timeout: request.timeout.unwrap_or(self.config.timeout),
            connect_timeout: self.config.connect_timeout,
            proxy: None,
            verify_tls: self.config.verify_ssl,
            follow_redirects: self.config.follow_redirects,
            max_redirects: self.config.max_redirects,
            http_version: self.config.http_version,
        }
    }

    async fn execute_prepared(&self, prepared: Request) -> ClientResult<Response> {
        let backend = prepared.backend.unwrap_or(self.config.default_backend);
        let transport = Arc::clone(self.transport_for(backend)?);
        let pool = Arc::clone(self.proxy.pool());
        let mut options = self.transport_options(&prepared);

        if !pool.has_proxies() {
            options.proxy = prepared.proxy.clone();
            if options.proxy.is_none() && self.config.proxy_required {
                return Err(ClientError::NoHealthyProxies);
            }
            let response = self
                .retry
                .execute(transport.as_ref(), &prepared, &options)
                .await?;
            return Ok(self.finish(&prepared, response));
        }

        // Pool configured: one pick per attempt chain, failing over to
        // the next healthy proxy when an attempt dies at the transport
        // layer.
        let max_picks = pool.total_count().max(1);
        let mut failed_picks = 0usize;

        loop {
            let Some(snapshot) = pool.get_proxy() else {
                if failed_picks > 0 {
                    return Err(ClientError::AllProxiesFailed);
                }
                if self.config.proxy_required {
                    return Err(ClientError::NoHealthyProxies);
                }
                // Empty available set, non-strict: proceed direct.
                options.proxy = prepared.proxy.clone();
                let response = self
                    .retry
                    .execute(transport.as_ref(), &prepared, &options)
                    .await?;
                return Ok(self.finish(&prepared, response));
            };

            let proxy_url = snapshot.config.url().to_string();
            debug!(proxy = %snapshot.config, "routing through proxy");
            options.proxy = Some(proxy_url.clone());

            match self
                .retry
                .execute(transport.as_ref(), &prepared, &options)
                .await
            {
                Ok(response) => {
                    pool.report_success(&proxy_url, Some(response.elapsed));
                    return Ok(self.finish(&prepared, response));
                }
                Err(error) if error.is_transport_failure() => {
                    pool.report_failure(&proxy_url, &error.to_string());
                    failed_picks += 1;
                    if failed_picks >= max_picks {
                        return Err(error);
                    }
                    warn!(
                        proxy = %snapshot.config,
                        "proxy attempt failed, trying next"
                    );
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Step 8 + 9: jar update and last-response bookkeeping.
    fn finish(&self, prepared: &Request, response: Response) -> Response {
        if let Some(jar) = &self.jar {
            jar.update_from_response(&prepared.url, &response.cookies);
        }
        *self.last_response.write() = Some(Arc::new(response.clone()));
        response
    }

    // ------------------------------------------------------------------
    // Verb methods
    // ------------------------------------------------------------------

    /// Build a request with an arbitrary method.
    #[must_use]
    pub fn request(&self, method: &str, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        ClientRequestBuilder::new(self, Request::builder(method, url))
    }

    /// Build a GET request.
    #[must_use]
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("GET", url)
    }

    /// Build a POST request.
    #[must_use]
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("POST", url)
    }

    /// Build a PUT request.
    #[must_use]
    pub fn put(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("PUT", url)
    }

    /// Build a DELETE request.
    #[must_use]
    pub fn delete(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("DELETE", url)
    }

    /// Build a HEAD request.
    #[must_use]
    pub fn head(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("HEAD", url)
    }

    /// Build a PATCH request.
    #[must_use]
    pub fn patch(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("PATCH", url)
    }

    /// Build an OPTIONS request.
    #[must_use]
    pub fn options(&self, url: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request("OPTIONS", url)
    }
}
