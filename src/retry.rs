//! Retry engine with status-code triggers and exponential backoff.
//!
//! Control flow branches on result variants: a transport error or a
//! retryable status schedules another attempt after `base^attempt`
//! seconds, anything else returns immediately. After the final attempt
//! the engine terminates with `MaxRetriesExceeded` carrying the last
//! cause. Backoff is deterministic (no jitter).

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;

use crate::error::ClientError;
use crate::models::{Request, Response};
use crate::transport::{Transport, TransportOptions};

/// Retry configuration knobs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt (total attempts = retries + 1).
    pub retries: u32,
    /// Status codes that trigger a retry.
    pub retry_codes: BTreeSet<u16>,
    /// Base for the `base^attempt` backoff progression.
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_codes: [429, 500, 502, 503, 504, 520, 521, 522, 523, 524]
                .into_iter()
                .collect(),
            backoff_base: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry following attempt `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_base.powi(attempt as i32))
    }

    /// Execute a request through `transport` with retries.
    ///
    /// Non-retryable statuses are returned unchanged for the caller to
    /// handle; the engine never raises on status by itself.
    pub async fn execute(
        &self,
        transport: &dyn Transport,
        request: &Request,
        options: &TransportOptions,
    ) -> Result<Response, ClientError> {
        let mut last_error: Option<ClientError> = None;

        for attempt in 0..=self.retries {
            match transport.request(request, options).await {
                Ok(response) => {
                    if self.retry_codes.contains(&response.status) {
                        last_error = Some(ClientError::Http {
                            status: response.status,
                            url: response.url.clone(),
                        });
                        if attempt < self.retries {
                            let backoff = self.backoff(attempt);
                            debug!(
                                status = response.status,
                                attempt,
                                backoff_secs = backoff.as_secs_f64(),
                                "retryable status, backing off"
                            );
                            tokio::time::sleep(backoff).await;
                            continue;
                        }
                    } else {
                        return Ok(response);
                    }
                }
                Err(error) => {
                    last_error = Some(ClientError::Transport(error));
                    if attempt < self.retries {
                        let backoff = self.backoff(attempt);
                        debug!(
                            attempt,
                            backoff_secs = backoff.as_secs_f64(),
                            "transport error, backing off"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                }
            }
        }

        Err(ClientError::MaxRetriesExceeded {
            url: request.url.clone(),
            attempts: self.retries + 1,
            source: last_error.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_progression_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));

        let gentle = RetryPolicy {
            backoff_base: 1.5,
            ..RetryPolicy::default()
        };
        assert!((gentle.backoff(2).as_secs_f64() - 2.25).abs() < 1e-9);
    }

    #[test]
    fn default_codes_cover_429_and_5xx() {
        let policy = RetryPolicy::default();
        assert!(policy.retry_codes.contains(&429));
        assert!(policy.retry_codes.contains(&503));
        assert!(!policy.retry_codes.contains(&404));
    }
}
