//! Browser fingerprint data and header composition.

pub mod composer;
pub mod profiles;

pub use composer::{api_headers, minimal_headers, HeaderComposer};
pub use profiles::{get_profile, list_profiles, BrowserProfile, DEFAULT_PROFILE};
