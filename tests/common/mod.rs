//! Shared test fixtures: a scriptable transport and response factories.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use scrapline::transport::BoxFuture;
use scrapline::{
    Headers, Request, Response, Transport, TransportError, TransportErrorKind, TransportOptions,
};

/// Handler signature for [`MockTransport`].
pub type Handler =
    Box<dyn Fn(&Request, &TransportOptions) -> Result<Response, TransportError> + Send + Sync>;

/// What one scripted transport call should produce.
pub enum Step {
    Ok(Response),
    Err(TransportErrorKind),
}

/// A recorded transport invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub proxy: Option<String>,
    pub headers: Headers,
    pub cookies: Vec<(String, String)>,
}

/// Install a test tracing subscriber once; later calls are no-ops.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scrapline=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Build a plain response for scripting.
pub fn response(status: u16, body: &str, url: &str) -> Response {
    Response {
        status,
        headers: Headers::new(),
        body: body.as_bytes().to_vec(),
        url: url.to_string(),
        cookies: Vec::new(),
        elapsed: Duration::from_millis(10),
        request: None,
        history: Vec::new(),
    }
}

/// Transport driven by a handler function, recording every call.
pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    /// Transport that plays back a fixed sequence of outcomes, then
    /// repeats the last one.
    pub fn scripted(steps: Vec<Step>) -> Arc<Self> {
        let script = Mutex::new(steps.into_iter().collect::<VecDeque<_>>());
        Self::with_handler(Box::new(move |request, _options| {
            let mut script = script.lock();
            let step = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().map(|step| match step {
                    Step::Ok(resp) => Step::Ok(resp.clone()),
                    Step::Err(kind) => Step::Err(*kind),
                })
            };
            match step {
                Some(Step::Ok(resp)) => Ok(resp),
                Some(Step::Err(kind)) => Err(TransportError::new(
                    kind,
                    &request.url,
                    "scripted transport failure",
                )),
                None => Ok(response(200, "", &request.url)),
            }
        }))
    }

    /// Transport that always succeeds with a 200.
    pub fn always_ok() -> Arc<Self> {
        Self::with_handler(Box::new(|request, _options| {
            Ok(response(200, "ok", &request.url))
        }))
    }

    /// Transport that fails whenever routed through a proxy whose URL
    /// contains `needle`, and succeeds otherwise.
    pub fn fail_proxy(needle: &str) -> Arc<Self> {
        let needle = needle.to_string();
        Self::with_handler(Box::new(move |request, options| {
            if options
                .proxy
                .as_deref()
                .is_some_and(|proxy| proxy.contains(&needle))
            {
                Err(TransportError::new(
                    TransportErrorKind::Connect,
                    &request.url,
                    "proxy unreachable",
                ))
            } else {
                Ok(response(200, "ok", &request.url))
            }
        }))
    }

    /// Transport that fails requests whose URL contains `needle`.
    pub fn fail_url(needle: &str) -> Arc<Self> {
        let needle = needle.to_string();
        Self::with_handler(Box::new(move |request, _options| {
            if request.url.contains(&needle) {
                Err(TransportError::new(
                    TransportErrorKind::Connect,
                    &request.url,
                    "scripted connect failure",
                ))
            } else {
                Ok(response(200, "ok", &request.url))
            }
        }))
    }

    /// Transport with a custom handler.
    pub fn with_handler(handler: Handler) -> Arc<Self> {
        Arc::new(Self {
            handler,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Transport for MockTransport {
    fn request<'a>(
        &'a self,
        request: &'a Request,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        Box::pin(async move {
            self.calls.lock().push(Call {
                url: request.url.clone(),
                proxy: options.proxy.clone(),
                headers: request.headers.clone(),
                cookies: request.cookies.clone(),
            });
            (self.handler)(request, options)
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}
