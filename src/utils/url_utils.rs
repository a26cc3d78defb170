//! URL parsing helpers.
//!
//! Every subsystem that keys state by domain (rate limiter, cookie jar,
//! Sec-Fetch derivation) goes through `extract_domain` so they all agree
//! on what "the domain" of a URL is: the host, lowercased, without port.

use url::Url;

/// Extract the domain (host, lowercased, no port) from a URL.
///
/// Returns `None` for unparseable URLs or URLs without a host.
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(str::to_lowercase)
}

/// Normalize a cookie or override domain for use as a storage key.
///
/// Lowercases and strips a single leading dot (`.example.com` and
/// `example.com` key the same bucket).
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    let lowered = domain.to_lowercase();
    match lowered.strip_prefix('.') {
        Some(stripped) => stripped.to_string(),
        None => lowered,
    }
}

/// Whether the URL uses the https scheme (secure cookies are only sent here).
#[must_use]
pub fn is_https(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.scheme().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Request path for cookie matching; empty paths normalize to `/`.
#[must_use]
pub fn request_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let path = parsed.path();
            if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            }
        }
        Err(_) => "/".to_string(),
    }
}
