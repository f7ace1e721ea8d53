//! Client fingerprint: a short, deterministic tag derived from stable headers.
//!
//! Not a secret and not an authenticator. It is embedded in issued tokens so
//! log lines can correlate a token with the browser that requested it.

use axum::http::HeaderMap;
use axum::http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::origin::header_str;

/// Number of base64 characters kept.
pub const FINGERPRINT_LEN: usize = 16;

/// Base64 of `User-Agent + Accept-Language + Accept-Encoding`, truncated to
/// [`FINGERPRINT_LEN`] characters. Missing headers contribute nothing.
pub fn create_fingerprint(headers: &HeaderMap) -> String {
    let material = [USER_AGENT, ACCEPT_LANGUAGE, ACCEPT_ENCODING]
        .iter()
        .map(|name| header_str(headers, name.as_str()).unwrap_or_default())
        .collect::<String>();

    let mut encoded = STANDARD.encode(material.as_bytes());
    // base64 output is ASCII, so byte truncation is on a char boundary
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}
