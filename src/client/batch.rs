//! Bounded-concurrency batch execution.
//!
//! `gather` fans requests out under a semaphore and writes every outcome
//! back to its input index, so completion order never reorders results.
//! With `stop_on_error`, the first failure stops further scheduling:
//! requests that have not started yet stay `None`, completed results are
//! kept.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::models::{BatchResult, Request};

use super::core::Client;

impl Client {
    /// Execute requests with bounded concurrency, preserving input order.
    ///
    /// `concurrency` defaults to the configured `default_concurrency`.
    /// Per-index errors are captured in the result, never propagated;
    /// call [`BatchResult::raise_on_error`] to surface the first one.
    pub async fn gather(
        &self,
        requests: Vec<Request>,
        concurrency: Option<usize>,
        stop_on_error: bool,
    ) -> BatchResult {
        let total = requests.len();
        let limit = concurrency
            .unwrap_or(self.config.default_concurrency)
            .max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let stop = Arc::new(AtomicBool::new(false));

        debug!(total, limit, stop_on_error, "starting batch");

        let tasks = requests.into_iter().enumerate().map(|(index, request)| {
            let semaphore = Arc::clone(&semaphore);
            let stop = Arc::clone(&stop);
            async move {
                if stop_on_error && stop.load(Ordering::SeqCst) {
                    return (index, None);
                }
                let Ok(_permit) = semaphore.acquire().await else {
                    return (index, None);
                };
                if stop_on_error && stop.load(Ordering::SeqCst) {
                    return (index, None);
                }

                let outcome = self.execute(request).await;
                if outcome.is_err() && stop_on_error {
                    stop.store(true, Ordering::SeqCst);
                }
                (index, Some(outcome))
            }
        });

        let outcomes = futures::future::join_all(tasks).await;

        let mut responses = Vec::with_capacity(total);
        responses.resize_with(total, || None);
        let mut errors = BTreeMap::new();

        for (index, outcome) in outcomes {
            match outcome {
                Some(Ok(response)) => responses[index] = Some(response),
                Some(Err(error)) => {
                    errors.insert(index, error);
                }
                None => {}
            }
        }

        BatchResult { responses, errors }
    }

    /// `gather` over plain URLs, issued as GET requests.
    pub async fn gather_urls<I, S>(
        &self,
        urls: I,
        concurrency: Option<usize>,
        stop_on_error: bool,
    ) -> BatchResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requests = urls.into_iter().map(Request::get).collect();
        self.gather(requests, concurrency, stop_on_error).await
    }
}
