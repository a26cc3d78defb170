//! Shared URL helpers used by the rate limiter, cookie jar, and header
//! composer.

pub mod url_utils;

pub use url_utils::{extract_domain, is_https, normalize_domain, request_path};
