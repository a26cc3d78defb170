//! Static browser fingerprint profiles.
//!
//! Each profile bundles a User-Agent, the header transmission order of the
//! real browser, Accept-family defaults, and (for the chromium family)
//! client-hint header values. The order tables matter: anti-bot systems
//! compare header order against the claimed browser.

use crate::error::ClientError;
use crate::models::Headers;

/// A browser fingerprint profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserProfile {
    /// Catalog name, e.g. `chrome_120`.
    pub name: &'static str,
    /// Impersonation tag consumed by TLS-fingerprinting transports.
    pub impersonate: &'static str,
    /// Default User-Agent.
    pub user_agent: &'static str,
    /// Header names in browser-native transmission order.
    pub header_order: &'static [&'static str],
    /// Default Accept value.
    pub accept: &'static str,
    /// Default Accept-Language value.
    pub accept_language: &'static str,
    /// Default Accept-Encoding value.
    pub accept_encoding: &'static str,
    /// `sec-ch-ua` value; empty for non-chromium browsers.
    pub sec_ch_ua: &'static str,
    /// `sec-ch-ua-mobile` value.
    pub sec_ch_ua_mobile: &'static str,
    /// `sec-ch-ua-platform` value; empty for non-chromium browsers.
    pub sec_ch_ua_platform: &'static str,
}

impl BrowserProfile {
    /// The profile's default header set (unordered; the composer orders).
    #[must_use]
    pub fn default_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("User-Agent", self.user_agent);
        headers.insert("Accept", self.accept);
        headers.insert("Accept-Language", self.accept_language);
        headers.insert("Accept-Encoding", self.accept_encoding);

        if !self.sec_ch_ua.is_empty() {
            headers.insert("Sec-CH-UA", self.sec_ch_ua);
            headers.insert("Sec-CH-UA-Mobile", self.sec_ch_ua_mobile);
            headers.insert("Sec-CH-UA-Platform", self.sec_ch_ua_platform);
        }
        headers
    }
}

const CHROMIUM_HEADER_ORDER: &[&str] = &[
    "Host",
    "Connection",
    "sec-ch-ua",
    "sec-ch-ua-mobile",
    "sec-ch-ua-platform",
    "Upgrade-Insecure-Requests",
    "User-Agent",
    "Accept",
    "Sec-Fetch-Site",
    "Sec-Fetch-Mode",
    "Sec-Fetch-User",
    "Sec-Fetch-Dest",
    "Referer",
    "Accept-Encoding",
    "Accept-Language",
    "Cookie",
];

const FIREFOX_HEADER_ORDER: &[&str] = &[
    "Host",
    "User-Agent",
    "Accept",
    "Accept-Language",
    "Accept-Encoding",
    "Connection",
    "Referer",
    "Cookie",
    "Upgrade-Insecure-Requests",
    "Sec-Fetch-Dest",
    "Sec-Fetch-Mode",
    "Sec-Fetch-Site",
    "Sec-Fetch-User",
];

const SAFARI_HEADER_ORDER: &[&str] = &[
    "Host",
    "Accept",
    "Sec-Fetch-Site",
    "Accept-Language",
    "Sec-Fetch-Mode",
    "Accept-Encoding",
    "Sec-Fetch-Dest",
    "User-Agent",
    "Referer",
    "Connection",
    "Cookie",
];

const CHROMIUM_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";
const FIREFOX_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const SAFARI_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// Name of the profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "chrome_120";

/// The full profile catalog, in catalog order.
pub static PROFILES: &[BrowserProfile] = &[
    BrowserProfile {
        name: "chrome_120",
        impersonate: "chrome120",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        header_order: CHROMIUM_HEADER_ORDER,
        accept: CHROMIUM_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "\"Windows\"",
    },
    BrowserProfile {
        name: "chrome_119",
        impersonate: "chrome119",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
        header_order: CHROMIUM_HEADER_ORDER,
        accept: CHROMIUM_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "\"Google Chrome\";v=\"119\", \"Chromium\";v=\"119\", \"Not?A_Brand\";v=\"24\"",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "\"Windows\"",
    },
    BrowserProfile {
        name: "chrome_118",
        impersonate: "chrome118",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
        header_order: CHROMIUM_HEADER_ORDER,
        accept: CHROMIUM_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "\"Chromium\";v=\"118\", \"Google Chrome\";v=\"118\", \"Not=A?Brand\";v=\"99\"",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "\"Windows\"",
    },
    BrowserProfile {
        name: "firefox_121",
        impersonate: "firefox121",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        header_order: FIREFOX_HEADER_ORDER,
        accept: FIREFOX_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "",
    },
    BrowserProfile {
        name: "firefox_120",
        impersonate: "firefox120",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
        header_order: FIREFOX_HEADER_ORDER,
        accept: FIREFOX_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "",
    },
    BrowserProfile {
        name: "firefox_117",
        impersonate: "firefox117",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:117.0) Gecko/20100101 Firefox/117.0",
        header_order: FIREFOX_HEADER_ORDER,
        accept: FIREFOX_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "",
    },
    BrowserProfile {
        name: "safari_17",
        impersonate: "safari17_0",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
        header_order: SAFARI_HEADER_ORDER,
        accept: SAFARI_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "",
    },
    BrowserProfile {
        name: "safari_16",
        impersonate: "safari16_0",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15",
        header_order: SAFARI_HEADER_ORDER,
        accept: SAFARI_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "",
    },
    BrowserProfile {
        name: "safari_15",
        impersonate: "safari15_5",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 12_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.6 Safari/605.1.15",
        header_order: SAFARI_HEADER_ORDER,
        accept: SAFARI_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "",
    },
    BrowserProfile {
        name: "edge_120",
        impersonate: "edge120",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
        header_order: CHROMIUM_HEADER_ORDER,
        accept: CHROMIUM_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Microsoft Edge\";v=\"120\"",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "\"Windows\"",
    },
    BrowserProfile {
        name: "edge_119",
        impersonate: "edge119",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
        header_order: CHROMIUM_HEADER_ORDER,
        accept: CHROMIUM_ACCEPT,
        accept_language: DEFAULT_ACCEPT_LANGUAGE,
        accept_encoding: DEFAULT_ACCEPT_ENCODING,
        sec_ch_ua: "\"Microsoft Edge\";v=\"119\", \"Chromium\";v=\"119\", \"Not?A_Brand\";v=\"24\"",
        sec_ch_ua_mobile: "?0",
        sec_ch_ua_platform: "\"Windows\"",
    },
];

/// Look up a profile by name, case-insensitively.
///
/// `None` selects [`DEFAULT_PROFILE`]; unknown names fail with the list
/// of available profiles.
pub fn get_profile(name: Option<&str>) -> Result<&'static BrowserProfile, ClientError> {
    let wanted = name.unwrap_or(DEFAULT_PROFILE).to_lowercase();
    PROFILES
        .iter()
        .find(|profile| profile.name == wanted)
        .ok_or_else(|| ClientError::UnknownProfile {
            name: wanted,
            available: list_profiles().join(", "),
        })
}

/// Sorted list of catalog profile names.
#[must_use]
pub fn list_profiles() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PROFILES.iter().map(|p| p.name).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_eleven_profiles() {
        assert_eq!(PROFILES.len(), 11);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let profile = get_profile(Some("CHROME_120")).expect("found");
        assert_eq!(profile.name, "chrome_120");
    }

    #[test]
    fn unknown_profile_fails_loudly() {
        let err = get_profile(Some("netscape_4")).unwrap_err();
        match err {
            ClientError::UnknownProfile { name, available } => {
                assert_eq!(name, "netscape_4");
                assert!(available.contains("chrome_120"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_profile_resolves() {
        let profile = get_profile(None).expect("default");
        assert_eq!(profile.name, DEFAULT_PROFILE);
    }

    #[test]
    fn chromium_profiles_carry_client_hints() {
        let chrome = get_profile(Some("chrome_120")).expect("found");
        let headers = chrome.default_headers();
        assert!(headers.contains("Sec-CH-UA"));
        assert!(headers.contains("Sec-CH-UA-Platform"));

        let firefox = get_profile(Some("firefox_121")).expect("found");
        let headers = firefox.default_headers();
        assert!(!headers.contains("Sec-CH-UA"));
    }
}
