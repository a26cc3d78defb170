//! HTTP response representation and helpers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::headers::Headers;
use super::request::Request;
use crate::error::ClientError;
use crate::safety::cookie_jar::Cookie;

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, in wire order.
    pub headers: Headers,
    /// Raw body bytes.
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub url: String,
    /// Cookies observed on this response (parsed `Set-Cookie` values;
    /// malformed ones are dropped).
    pub cookies: Vec<Cookie>,
    /// Wall-clock span of the transport round-trip.
    pub elapsed: Duration,
    /// The prepared request that produced this response.
    pub request: Option<Box<Request>>,
    /// Redirect history, oldest first, when the transport records it.
    pub history: Vec<Response>,
}

impl Response {
    /// Decode the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ClientError::Http`].
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.ok() {
            Ok(self)
        } else {
            Err(ClientError::Http {
                status: self.status,
                url: self.url,
            })
        }
    }

    /// Body length in bytes.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Effective transfer rate in bytes per second; 0 when elapsed is 0.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.body.len() as f64 / secs
        }
    }

    /// Response cookies as (name, value) pairs.
    #[must_use]
    pub fn cookie_values(&self) -> Vec<(String, String)> {
        self.cookies
            .iter()
            .map(|cookie| (cookie.name.clone(), cookie.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &[u8], elapsed: Duration) -> Response {
        Response {
            status,
            headers: Headers::new(),
            body: body.to_vec(),
            url: "https://example.com/".to_string(),
            cookies: Vec::new(),
            elapsed,
            request: None,
            history: Vec::new(),
        }
    }

    #[test]
    fn text_replaces_invalid_utf8() {
        let resp = response(200, &[0x68, 0x69, 0xFF], Duration::ZERO);
        assert_eq!(resp.text(), "hi\u{FFFD}");
    }

    #[test]
    fn ok_covers_2xx_only() {
        assert!(response(200, b"", Duration::ZERO).ok());
        assert!(response(204, b"", Duration::ZERO).ok());
        assert!(!response(301, b"", Duration::ZERO).ok());
        assert!(!response(404, b"", Duration::ZERO).ok());
    }

    #[test]
    fn error_for_status_surfaces_http_error() {
        let err = response(503, b"", Duration::ZERO)
            .error_for_status()
            .unwrap_err();
        match err {
            ClientError::Http { status, url } => {
                assert_eq!(status, 503);
                assert_eq!(url, "https://example.com/");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bandwidth_zero_when_instant() {
        let resp = response(200, b"abcd", Duration::ZERO);
        assert_eq!(resp.bandwidth(), 0.0);

        let resp = response(200, &[0u8; 1000], Duration::from_secs(2));
        assert!((resp.bandwidth() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn json_decodes_body() {
        let resp = response(200, br#"{"answer": 42}"#, Duration::ZERO);
        let value: serde_json::Value = resp.json().expect("valid json");
        assert_eq!(value["answer"], 42);
    }
}
