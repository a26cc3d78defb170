//! In-memory cookie storage with domain/path/secure matching.
//!
//! Storage is domain -> name -> cookie with normalized domain keys
//! (lowercase, no leading dot). Lookups sweep expired cookies first, so
//! callers never observe an expired cookie; the sweep is the only
//! mutation a lookup performs.

use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::utils::{extract_domain, is_https, normalize_domain, request_path};

/// A single cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie domain; empty means "inferred from the request URL".
    pub domain: String,
    /// Cookie path, `/` by default.
    pub path: String,
    /// Absolute expiry; `None` is a session cookie.
    pub expires: Option<SystemTime>,
    /// Only sent over https.
    pub secure: bool,
    /// Not exposed to scripts (informational here).
    pub http_only: bool,
}

impl Cookie {
    /// Create a session cookie with default path `/`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the cookie domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the cookie path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set an absolute expiry time.
    #[must_use]
    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Mark as https-only.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Whether the cookie has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self.expires {
            Some(expires) => SystemTime::now() > expires,
            None => false,
        }
    }

    /// Domain matching: exact, leading-dot suffix, or strict subdomain.
    #[must_use]
    pub fn matches_domain(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        let cookie_domain = self.domain.to_lowercase();

        if host == cookie_domain {
            return true;
        }
        if let Some(bare) = cookie_domain.strip_prefix('.') {
            return host == bare || host.ends_with(&cookie_domain);
        }
        host.ends_with(&format!(".{cookie_domain}"))
    }

    /// Path matching: prefix match on the request path.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        if self.path == "/" {
            return true;
        }
        path.starts_with(&self.path)
    }

    /// Parse one `Set-Cookie` header value.
    ///
    /// `default_domain` is used when the header carries no `Domain`
    /// attribute. Returns `None` for values without a `name=value` pair;
    /// unknown attributes are ignored.
    #[must_use]
    pub fn parse_set_cookie(header: &str, default_domain: &str) -> Option<Self> {
        let mut parts = header.split(';');

        let pair = parts.next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim()).with_domain(default_domain);

        for attribute in parts {
            let attribute = attribute.trim();
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim(), Some(val.trim())),
                None => (attribute, None),
            };

            if key.eq_ignore_ascii_case("domain") {
                if let Some(val) = val {
                    if !val.is_empty() {
                        cookie.domain = val.to_string();
                    }
                }
            } else if key.eq_ignore_ascii_case("path") {
                if let Some(val) = val {
                    if !val.is_empty() {
                        cookie.path = val.to_string();
                    }
                }
            } else if key.eq_ignore_ascii_case("max-age") {
                if let Some(seconds) = val.and_then(|v| v.parse::<i64>().ok()) {
                    cookie.expires = if seconds <= 0 {
                        Some(SystemTime::UNIX_EPOCH)
                    } else {
                        SystemTime::now().checked_add(std::time::Duration::from_secs(seconds as u64))
                    };
                }
            } else if key.eq_ignore_ascii_case("expires") {
                // Max-Age wins over Expires when both are present.
                if cookie.expires.is_none() {
                    if let Some(parsed) = val.and_then(parse_http_date) {
                        cookie.expires = Some(parsed);
                    }
                }
            } else if key.eq_ignore_ascii_case("secure") {
                cookie.secure = true;
            } else if key.eq_ignore_ascii_case("httponly") {
                cookie.http_only = true;
            }
        }

        Some(cookie)
    }
}

/// Parse an HTTP date (RFC 1123 / RFC 850 / asctime) into `SystemTime`.
fn parse_http_date(value: &str) -> Option<SystemTime> {
    use chrono::{DateTime, NaiveDateTime, Utc};

    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc).into());
    }
    for format in ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into());
        }
    }
    None
}

/// Thread-safe in-memory cookie jar.
pub struct CookieJar {
    // domain (normalized) -> name -> cookie
    cookies: Mutex<HashMap<String, HashMap<String, Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cookies: Mutex::new(HashMap::new()),
        }
    }

    fn sweep_expired(store: &mut HashMap<String, HashMap<String, Cookie>>) {
        store.retain(|_, domain_cookies| {
            domain_cookies.retain(|_, cookie| !cookie.is_expired());
            !domain_cookies.is_empty()
        });
    }

    /// Store a cookie. Overwriting the same (domain, name) replaces it.
    pub fn set(&self, cookie: Cookie) {
        let key = normalize_domain(&cookie.domain);
        let mut store = self.cookies.lock();
        store
            .entry(key)
            .or_default()
            .insert(cookie.name.clone(), cookie);
    }

    /// Cookies applicable to `url` as (name, value) pairs.
    ///
    /// A cookie is returned iff it is unexpired, its domain matches the
    /// URL host, its path prefixes the URL path, and it is not a secure
    /// cookie on a plain-http URL. Expired cookies are swept as part of
    /// the lookup.
    #[must_use]
    pub fn get_for_url(&self, url: &str) -> Vec<(String, String)> {
        let Some(host) = extract_domain(url) else {
            return Vec::new();
        };
        let path = request_path(url);
        let secure_context = is_https(url);

        let mut store = self.cookies.lock();
        Self::sweep_expired(&mut store);

        let mut matched: Vec<(String, String)> = Vec::new();
        for domain_cookies in store.values() {
            for cookie in domain_cookies.values() {
                if !cookie.matches_domain(&host) {
                    continue;
                }
                if !cookie.matches_path(&path) {
                    continue;
                }
                if cookie.secure && !secure_context {
                    continue;
                }
                match matched.iter_mut().find(|(name, _)| *name == cookie.name) {
                    Some(entry) => entry.1 = cookie.value.clone(),
                    None => matched.push((cookie.name.clone(), cookie.value.clone())),
                }
            }
        }
        matched
    }

    /// Store response cookies under the request's domain.
    ///
    /// Cookies without a domain inherit the URL host. Never fails: a
    /// request with an unparseable URL simply stores nothing.
    pub fn update_from_response(&self, url: &str, cookies: &[Cookie]) {
        let Some(host) = extract_domain(url) else {
            return;
        };

        let mut store = self.cookies.lock();
        for cookie in cookies {
            let mut owned = cookie.clone();
            if owned.domain.is_empty() {
                owned.domain = host.clone();
            }
            let key = normalize_domain(&owned.domain);
            store.entry(key).or_default().insert(owned.name.clone(), owned);
        }
    }

    /// Delete a specific cookie. Returns whether it existed.
    pub fn delete(&self, name: &str, domain: &str) -> bool {
        let key = normalize_domain(domain);
        let mut store = self.cookies.lock();
        if let Some(domain_cookies) = store.get_mut(&key) {
            let removed = domain_cookies.remove(name).is_some();
            if domain_cookies.is_empty() {
                store.remove(&key);
            }
            return removed;
        }
        false
    }

    /// Remove all cookies for one domain.
    pub fn clear_domain(&self, domain: &str) {
        self.cookies.lock().remove(&normalize_domain(domain));
    }

    /// Remove everything.
    pub fn clear_all(&self) {
        self.cookies.lock().clear();
    }

    /// Snapshot of all unexpired cookies, domain -> name -> value.
    #[must_use]
    pub fn all(&self) -> HashMap<String, HashMap<String, String>> {
        let mut store = self.cookies.lock();
        Self::sweep_expired(&mut store);
        store
            .iter()
            .map(|(domain, cookies)| {
                (
                    domain.clone(),
                    cookies
                        .iter()
                        .map(|(name, cookie)| (name.clone(), cookie.value.clone()))
                        .collect(),
                )
            })
            .collect()
    }

    /// Total number of stored cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.lock().values().map(HashMap::len).sum()
    }

    /// Whether the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
