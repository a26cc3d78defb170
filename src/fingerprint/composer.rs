//! Header composition for stealth requests.
//!
//! The composer turns a profile plus request context into a header map
//! whose iteration order matches the profile's transmission order. It
//! also derives the Sec-Fetch family from the referer chain it maintains
//! across calls, and lets caller headers win every conflict.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;
use url::Url;

use super::profiles::BrowserProfile;
use crate::models::Headers;

/// Common multi-level TLDs, enough to tell `same-site` from `cross-site`
/// without carrying a full public-suffix list.
static MULTI_LEVEL_TLDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "co.uk", "org.uk", "gov.uk", "ac.uk",
        "com.au", "org.au", "gov.au", "edu.au",
        "co.nz", "org.nz", "gov.nz",
        "co.jp", "or.jp", "ne.jp",
        "com.br", "org.br", "gov.br",
        "co.in", "org.in", "gov.in",
        "com.cn", "org.cn", "gov.cn",
    ]
    .into_iter()
    .collect()
});

/// Extract the registrable domain (eTLD+1) from a host.
fn registrable_domain(host: &str) -> String {
    let host = host.split(':').next().unwrap_or(host).to_lowercase();
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return host;
    }

    for tld in MULTI_LEVEL_TLDS.iter() {
        if host == *tld {
            return host;
        }
        if host.ends_with(&format!(".{tld}")) {
            let tld_len = tld.split('.').count();
            if parts.len() > tld_len {
                return parts[parts.len() - tld_len - 1..].join(".");
            }
            return host;
        }
    }

    parts[parts.len() - 2..].join(".")
}

/// Whether two hosts share a registrable domain.
fn is_same_site(host_a: &str, host_b: &str) -> bool {
    if host_a.is_empty() || host_b.is_empty() {
        return false;
    }
    registrable_domain(host_a) == registrable_domain(host_b)
}

/// Composes profile-ordered stealth headers and tracks the referer chain.
pub struct HeaderComposer {
    profile: &'static BrowserProfile,
    last_referer: Mutex<Option<String>>,
}

impl HeaderComposer {
    /// Create a composer for the given profile.
    #[must_use]
    pub fn new(profile: &'static BrowserProfile) -> Self {
        Self {
            profile,
            last_referer: Mutex::new(None),
        }
    }

    /// The active profile.
    #[must_use]
    pub fn profile(&self) -> &'static BrowserProfile {
        self.profile
    }

    /// Compose ordered headers for a request.
    ///
    /// Layering, lowest to highest priority: profile defaults, Sec-Fetch
    /// family, managed Referer, then `custom` (caller always wins). The
    /// result iterates profile-ordered names first, then the rest in
    /// insertion order. The referer chain advances to `url` afterwards.
    #[must_use]
    pub fn compose(&self, url: &str, method: &str, custom: &Headers) -> Headers {
        let mut headers = self.profile.default_headers();

        let last_referer = { self.last_referer.lock().clone() };

        for (name, value) in self.sec_fetch_headers(url, method, last_referer.as_deref()) {
            headers.insert(name, value);
        }

        if let Some(referer) = &last_referer {
            headers.insert("Referer", referer.clone());
        }

        headers.extend(custom);

        let ordered = self.order_headers(&headers);

        *self.last_referer.lock() = Some(url.to_string());

        ordered
    }

    /// Derive the Sec-Fetch family for a navigation to `url`.
    ///
    /// `Site` is `none` before any referer is known, `same-origin` on a
    /// netloc match, `same-site` on a shared registrable domain, and
    /// `cross-site` otherwise. GET navigations also carry
    /// `Sec-Fetch-User: ?1`.
    fn sec_fetch_headers(
        &self,
        url: &str,
        method: &str,
        last_referer: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let target_host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase));

        let site = match (&target_host, last_referer) {
            (None, _) => "cross-site",
            (Some(_), None) => "none",
            (Some(target), Some(referer)) => {
                let referer_host = Url::parse(referer)
                    .ok()
                    .and_then(|u| u.host_str().map(str::to_lowercase));
                match referer_host {
                    Some(ref_host) if ref_host == *target => "same-origin",
                    Some(ref_host) if is_same_site(&ref_host, target) => "same-site",
                    Some(_) => "cross-site",
                    None => "cross-site",
                }
            }
        };

        let mut headers = vec![
            ("Sec-Fetch-Site", site.to_string()),
            ("Sec-Fetch-Mode", "navigate".to_string()),
            ("Sec-Fetch-Dest", "document".to_string()),
        ];
        if method.eq_ignore_ascii_case("GET") {
            headers.push(("Sec-Fetch-User", "?1".to_string()));
        }
        headers
    }

    /// Reorder headers to the profile's transmission order; names not in
    /// the profile list are appended in their insertion order.
    fn order_headers(&self, headers: &Headers) -> Headers {
        let mut ordered = Headers::new();

        for profile_name in self.profile.header_order {
            if let Some(value) = headers.get(profile_name) {
                // Keep the caller's capitalization when it matches a
                // profile slot case-insensitively.
                let original = headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(profile_name))
                    .map(|(name, _)| name.to_string())
                    .unwrap_or_else(|| (*profile_name).to_string());
                ordered.insert(original, value);
            }
        }
        for (name, value) in headers.iter() {
            if !ordered.contains(name) {
                ordered.insert(name, value);
            }
        }
        ordered
    }

    /// Forget the referer chain (fresh navigation).
    pub fn reset_referer_chain(&self) {
        *self.last_referer.lock() = None;
    }

    /// Manually set the referer for the next request.
    pub fn set_referer(&self, url: impl Into<String>) {
        *self.last_referer.lock() = Some(url.into());
    }
}

/// Minimal header set for speed mode.
#[must_use]
pub fn minimal_headers() -> Headers {
    [
        (
            "User-Agent",
            concat!("scrapline/", env!("CARGO_PKG_VERSION")),
        ),
        ("Accept", "*/*"),
        ("Accept-Encoding", "gzip, deflate"),
        ("Connection", "keep-alive"),
    ]
    .into_iter()
    .collect()
}

/// Header set for JSON API requests.
#[must_use]
pub fn api_headers() -> Headers {
    [
        ("Accept", "application/json"),
        ("Accept-Encoding", "gzip, deflate"),
        ("Content-Type", "application/json"),
    ]
    .into_iter()
    .collect()
}
