//! Behavioural tests for the security core through its public API.
//!
//! Run with: `cargo test --test security_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};

use relay_guard::security::{
    Clock, FixedWindowLimiter, ManualClock, OriginPolicy, RateLimitPolicy, RateLimitStore,
    SecurityError, SecurityErrorKind, SecurityGuard, SystemClock, TokenPayload, TokenService,
    create_fingerprint, validate_user_agent,
};

const ALLOWED: &str = "https://allowed.example";

fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(*name, HeaderValue::from_str(value).unwrap());
    }
    map
}

fn limiter(clock: &ManualClock) -> FixedWindowLimiter {
    FixedWindowLimiter::new(
        Arc::new(RateLimitStore::new()),
        Arc::new(clock.clone()),
        RateLimitPolicy {
            cleanup_probability: 0.0,
            ..RateLimitPolicy::default()
        },
    )
}

fn guard(clock: &ManualClock, secret: Option<&str>) -> SecurityGuard {
    SecurityGuard::new(
        OriginPolicy::new([ALLOWED]),
        limiter(clock),
        TokenService::new(secret),
        Arc::new(clock.clone()),
    )
}

mod origin {
    use super::*;

    #[test]
    fn exact_origin_matches() {
        let policy = OriginPolicy::new([ALLOWED]);
        assert!(policy.validate_origin(&headers(&[("origin", ALLOWED)])));
        assert!(!policy.validate_origin(&headers(&[("origin", "https://other.example")])));
    }

    #[test]
    fn referer_prefix_matches_even_with_foreign_origin() {
        let policy = OriginPolicy::new([ALLOWED]);
        let h = headers(&[
            ("origin", "https://other.example"),
            ("referer", "https://allowed.example/page"),
        ]);
        assert!(policy.validate_origin(&h));

        let h = headers(&[("referer", "https://allowed.example/page")]);
        assert!(policy.validate_origin(&h));
    }

    #[test]
    fn user_agent_requires_mozilla() {
        assert!(!validate_user_agent(&HeaderMap::new()));
        assert!(!validate_user_agent(&headers(&[("user-agent", "curl/8.5.0")])));
        assert!(validate_user_agent(&headers(&[(
            "user-agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64)"
        )])));
    }
}

mod rate_limit {
    use super::*;

    #[test]
    fn thirty_allowed_then_rejected_then_reset() {
        let clock = ManualClock::new(0);
        let limiter = limiter(&clock);

        for _ in 0..30 {
            assert!(limiter.check("198.51.100.7"));
        }
        assert!(!limiter.check("198.51.100.7"));

        clock.advance(Duration::from_secs(60));
        assert!(limiter.check("198.51.100.7"));
        assert_eq!(
            limiter.store().count("198.51.100.7", limiter.current_window()),
            1
        );
    }

    #[test]
    fn forwarded_for_first_entry_identifies_client() {
        let clock = ManualClock::new(0);
        let limiter = limiter(&clock);
        let h = headers(&[("x-forwarded-for", "203.0.113.5, 10.0.0.1")]);

        assert!(limiter.check_rate_limit(&h));
        assert_eq!(limiter.store().count("203.0.113.5", 0), 1);
    }
}

mod fingerprint {
    use super::*;

    #[test]
    fn deterministic_and_language_sensitive() {
        let a = headers(&[("user-agent", "Mozilla"), ("accept-language", "en-US")]);
        let b = headers(&[("user-agent", "Mozilla"), ("accept-language", "de-DE")]);

        assert_eq!(create_fingerprint(&a), create_fingerprint(&a));
        assert_ne!(create_fingerprint(&a), create_fingerprint(&b));
        assert!(create_fingerprint(&a).len() <= 16);
    }
}

mod tokens {
    use super::*;

    fn payload(issued_at: u64) -> TokenPayload {
        TokenPayload {
            origin: ALLOWED.to_string(),
            fingerprint: "abc".to_string(),
            issued_at,
        }
    }

    #[test]
    fn round_trip_preserves_origin() {
        let service = TokenService::new(Some("s3cret"));
        let token = service
            .generate_token(&payload(SystemClock.now_secs()))
            .unwrap();
        assert_eq!(service.verify_token(&token).unwrap().origin, ALLOWED);
    }

    #[test]
    fn token_older_than_an_hour_is_invalid() {
        let service = TokenService::new(Some("s3cret"));
        let issued_at = SystemClock.now_secs() - 3601 - 1;
        let token = service.generate_token(&payload(issued_at)).unwrap();

        let err = service.verify_token(&token).unwrap_err();
        assert_eq!(err.kind(), SecurityErrorKind::InvalidToken);
    }

    #[test]
    fn unset_secret_is_configuration_error() {
        let err = TokenService::new(None)
            .generate_token(&payload(0))
            .unwrap_err();
        assert!(matches!(err, SecurityError::Configuration(ref m) if m == "JWT_SECRET not configured"));
    }
}

mod orchestrator {
    use super::*;

    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64)";

    #[test]
    fn valid_browser_under_quota_passes() {
        let clock = ManualClock::new(0);
        let h = headers(&[("origin", ALLOWED), ("user-agent", UA)]);
        assert!(guard(&clock, None).validate_request(&h).is_ok());
    }

    #[test]
    fn evil_origin_is_rejected_without_touching_store() {
        let clock = ManualClock::new(0);
        let guard = guard(&clock, None);
        let h = headers(&[("origin", "https://evil.example"), ("user-agent", UA)]);

        let err = guard.validate_request(&h).unwrap_err();
        assert!(matches!(err, SecurityError::InvalidOrigin));
        assert!(guard.limiter().store().is_empty());
    }

    #[test]
    fn issued_token_passes_authorize() {
        // Token expiry is checked against the real clock.
        let clock = ManualClock::new(SystemClock.now_millis());
        let guard = guard(&clock, Some("s3cret"));
        let h = headers(&[("origin", ALLOWED), ("user-agent", UA)]);

        let issued = guard.issue_token(&h).unwrap();
        let mut with_bearer = h.clone();
        with_bearer.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", issued.token)).unwrap(),
        );

        let claims = guard.authorize(&with_bearer).unwrap().unwrap();
        assert_eq!(claims.origin, ALLOWED);
        assert_eq!(claims.fingerprint, create_fingerprint(&h));
    }

    #[test]
    fn authorization_without_bearer_prefix_is_verified_as_is() {
        let clock = ManualClock::new(SystemClock.now_millis());
        let guard = guard(&clock, Some("s3cret"));
        let h = headers(&[("origin", ALLOWED), ("user-agent", UA)]);

        let issued = guard.issue_token(&h).unwrap();
        let mut raw = h.clone();
        raw.insert(
            "authorization",
            HeaderValue::from_str(&issued.token).unwrap(),
        );
        assert!(guard.authorize(&raw).unwrap().is_some());

        let mut basic = h;
        basic.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        let err = guard.authorize(&basic).unwrap_err();
        assert_eq!(err.kind(), SecurityErrorKind::InvalidToken);
    }
}
