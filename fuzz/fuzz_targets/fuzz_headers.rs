//! Fuzz the header-driven security checks.
//!
//! Arbitrary `Origin`, `Referer`, `User-Agent`, forwarding and bearer headers
//! are fed through the full guard. Every check must return a verdict without
//! panicking, and the fingerprint must never exceed its fixed length.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_headers -- -max_total_time=60
//! ```

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use axum::http::{HeaderMap, HeaderValue};
use libfuzzer_sys::fuzz_target;
use relay_guard::security::{
    FINGERPRINT_LEN, FixedWindowLimiter, ManualClock, OriginPolicy, RateLimitPolicy,
    RateLimitStore, SecurityGuard, TokenService, client_identity, create_fingerprint,
};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    allowed: Vec<&'a str>,
    origin: Option<&'a [u8]>,
    referer: Option<&'a [u8]>,
    user_agent: Option<&'a [u8]>,
    forwarded_for: Option<&'a [u8]>,
    real_ip: Option<&'a [u8]>,
    authorization: Option<&'a [u8]>,
    now_millis: u64,
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: Option<&[u8]>) {
    if let Some(Ok(value)) = value.map(HeaderValue::from_bytes) {
        headers.insert(name, value);
    }
}

fuzz_target!(|input: Input<'_>| {
    let mut headers = HeaderMap::new();
    insert(&mut headers, "origin", input.origin);
    insert(&mut headers, "referer", input.referer);
    insert(&mut headers, "user-agent", input.user_agent);
    insert(&mut headers, "x-forwarded-for", input.forwarded_for);
    insert(&mut headers, "x-real-ip", input.real_ip);
    insert(&mut headers, "authorization", input.authorization);

    let fingerprint = create_fingerprint(&headers);
    assert!(fingerprint.len() <= FINGERPRINT_LEN);
    let _ = client_identity(&headers);

    let clock = Arc::new(ManualClock::new(input.now_millis));
    let limiter = FixedWindowLimiter::new(
        Arc::new(RateLimitStore::new()),
        clock.clone(),
        RateLimitPolicy::default(),
    );
    let guard = SecurityGuard::new(
        OriginPolicy::new(input.allowed),
        limiter,
        TokenService::new(Some("fuzz-secret")),
        clock,
    );

    let _ = guard.authorize(&headers);
    let _ = guard.issue_token(&headers);
});
