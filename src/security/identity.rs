//! Best-effort client identity for rate limiting.
//!
//! # Security Warning: IP Spoofing Risk
//!
//! These functions trust client-provided headers. A client talking to this
//! service directly can rotate `X-Forwarded-For` values and get a fresh quota
//! each time. Deploy behind a proxy that overwrites (not appends to) the
//! forwarding headers:
//!
//! ```nginx
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```
//!
//! # The "unknown" Fallback
//!
//! Requests carrying neither header share the [`UNKNOWN_CLIENT`] key and are
//! therefore rate-limited collectively.

use std::borrow::Cow;

use axum::http::HeaderMap;

/// Identity used when no forwarding header yields a value.
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Where the identity was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource<'a> {
    /// First entry of `X-Forwarded-For`.
    ForwardedFor(&'a str),
    /// `X-Real-IP`.
    RealIp(&'a str),
    /// Neither header present (or both empty).
    Unknown,
}

impl<'a> IdentitySource<'a> {
    /// Inspect forwarding headers in priority order.
    ///
    /// An empty first `X-Forwarded-For` entry counts as absent and falls
    /// through to `X-Real-IP`.
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        if let Some(value) = headers.get(X_FORWARDED_FOR)
            && let Ok(value) = value.to_str()
            && let Some(first) = value.split(',').next().map(str::trim)
            && !first.is_empty()
        {
            return Self::ForwardedFor(first);
        }

        if let Some(value) = headers.get(X_REAL_IP)
            && let Ok(value) = value.to_str()
            && !value.trim().is_empty()
        {
            return Self::RealIp(value.trim());
        }

        Self::Unknown
    }

    /// The identity string, borrowing the sentinel for the unknown case.
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::ForwardedFor(ip) | Self::RealIp(ip) => ip,
            Self::Unknown => UNKNOWN_CLIENT,
        }
    }
}

/// Extract the client identity used as the rate-limit key.
///
/// Priority: first `X-Forwarded-For` entry, then `X-Real-IP`, then
/// [`UNKNOWN_CLIENT`]. Returns `Cow::Borrowed` for the sentinel so the common
/// header-less path does not allocate.
#[inline]
pub fn client_identity(headers: &HeaderMap) -> Cow<'static, str> {
    match IdentitySource::from_headers(headers) {
        IdentitySource::ForwardedFor(ip) | IdentitySource::RealIp(ip) => Cow::Owned(ip.to_string()),
        IdentitySource::Unknown => Cow::Borrowed(UNKNOWN_CLIENT),
    }
}
