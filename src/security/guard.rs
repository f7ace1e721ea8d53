use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, ORIGIN, REFERER};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::error::SecurityError;
use super::fingerprint::create_fingerprint;
use super::identity::client_identity;
use super::origin::{OriginPolicy, header_str, validate_user_agent};
use super::rate_limit::FixedWindowLimiter;
use super::token::{TOKEN_TTL_SECS, TOKEN_TYPE, TokenClaims, TokenPayload, TokenService};
use crate::metrics;

const BEARER_PREFIX: &str = "Bearer ";

/// Body returned by the token-issuance endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
    #[serde(rename = "type")]
    pub token_type: &'static str,
}

/// The single pass/fail gate every relay handler goes through.
///
/// Checks run in a fixed order and stop at the first failure:
///
/// ```text
/// origin/referer ──✗──► InvalidOrigin      (403)
///      │ ✓
/// user-agent ─────✗──► InvalidUserAgent   (403)
///      │ ✓
/// rate limit ─────✗──► RateLimitExceeded  (429)
///      │ ✓
/// bearer token? ──✗──► InvalidToken       (401)
/// ```
///
/// Provenance is checked before the rate limiter, so rejected requests never
/// consume quota.
#[derive(Debug, Clone)]
pub struct SecurityGuard {
    origins: Arc<OriginPolicy>,
    limiter: FixedWindowLimiter,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
}

impl SecurityGuard {
    pub fn new(
        origins: OriginPolicy,
        limiter: FixedWindowLimiter,
        tokens: TokenService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            origins: Arc::new(origins),
            limiter,
            tokens,
            clock,
        }
    }

    pub fn origins(&self) -> &OriginPolicy {
        &self.origins
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn validate_origin(&self, headers: &HeaderMap) -> bool {
        self.origins.validate_origin(headers)
    }

    pub fn validate_user_agent(&self, headers: &HeaderMap) -> bool {
        validate_user_agent(headers)
    }

    pub fn check_rate_limit(&self, headers: &HeaderMap) -> bool {
        self.limiter.check_rate_limit(headers)
    }

    /// Origin, then user-agent, then rate limit.
    pub fn validate_request(&self, headers: &HeaderMap) -> Result<(), SecurityError> {
        let result = if !self.validate_origin(headers) {
            Err(SecurityError::InvalidOrigin)
        } else if !self.validate_user_agent(headers) {
            Err(SecurityError::InvalidUserAgent)
        } else if !self.check_rate_limit(headers) {
            Err(SecurityError::RateLimitExceeded)
        } else {
            Ok(())
        };

        if let Err(ref e) = result {
            let client = client_identity(headers);
            warn!(
                client = %client,
                origin = header_str(headers, ORIGIN.as_str()).unwrap_or("-"),
                reason = e.kind().as_str(),
                "Request rejected: {e}"
            );
            metrics::record_security_rejection(e.kind().as_str());
        }
        result
    }

    /// Full gate for relay handlers.
    ///
    /// Runs [`validate_request`](Self::validate_request), then verifies a
    /// bearer token if a non-empty `Authorization` header is present. Requests
    /// without one are still accepted.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Option<TokenClaims>, SecurityError> {
        self.validate_request(headers)?;

        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(None);
        };

        // A non-UTF-8 header cannot be a JWT; let the verifier reject it.
        let raw = value.to_str().unwrap_or("\u{fffd}");
        if raw.is_empty() {
            return Ok(None);
        }
        let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw);

        match self.tokens.verify_token(token) {
            Ok(claims) => {
                info!(origin = %claims.origin, "Valid token");
                Ok(Some(claims))
            }
            Err(e) => {
                warn!(error = %e, "Bearer token rejected");
                metrics::record_security_rejection(e.kind().as_str());
                Err(e)
            }
        }
    }

    /// Validate the request and mint a token bound to its origin and
    /// fingerprint.
    pub fn issue_token(&self, headers: &HeaderMap) -> Result<IssuedToken, SecurityError> {
        self.validate_request(headers)?;

        let fingerprint = create_fingerprint(headers);
        let origin = header_str(headers, ORIGIN.as_str())
            .filter(|o| !o.is_empty())
            .or_else(|| header_str(headers, REFERER.as_str()))
            .unwrap_or_default()
            .to_string();

        let payload = TokenPayload {
            origin,
            fingerprint,
            issued_at: self.clock.now_secs(),
        };
        let token = self.tokens.generate_token(&payload).inspect_err(|e| {
            metrics::record_security_rejection(e.kind().as_str());
        })?;

        debug!(fingerprint = %payload.fingerprint, "Token issued");
        metrics::record_token_issued();

        Ok(IssuedToken {
            token,
            expires_in: TOKEN_TTL_SECS,
            token_type: TOKEN_TYPE,
        })
    }
}
