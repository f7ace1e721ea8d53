//! Request validation and token issuance shared by every relay endpoint.
//!
//! # Components
//!
//! - **Origin/Agent Validator** ([`OriginPolicy`], [`validate_user_agent`]):
//!   allow-list match on `Origin` / `Referer` prefix, crude browser check
//! - **Rate Limiter** ([`FixedWindowLimiter`] over a [`RateLimitStore`]):
//!   30 requests per client per 60 s window by default
//! - **Fingerprint Generator** ([`create_fingerprint`]): base64 header digest
//! - **Token Service** ([`TokenService`]): HS256 tokens, one-hour lifetime
//! - **Orchestrator** ([`SecurityGuard`]): runs the checks in order
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use axum::http::HeaderMap;
//! use relay_guard::security::{
//!     FixedWindowLimiter, OriginPolicy, RateLimitPolicy, RateLimitStore, SecurityGuard,
//!     SystemClock, TokenService,
//! };
//!
//! let clock = Arc::new(SystemClock);
//! let limiter = FixedWindowLimiter::new(
//!     Arc::new(RateLimitStore::new()),
//!     clock.clone(),
//!     RateLimitPolicy::default(),
//! );
//! let guard = SecurityGuard::new(
//!     OriginPolicy::new(["https://app.example.com"]),
//!     limiter,
//!     TokenService::new(Some("secret")),
//!     clock,
//! );
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("origin", "https://app.example.com".parse().unwrap());
//! headers.insert("user-agent", "Mozilla/5.0".parse().unwrap());
//! assert!(guard.validate_request(&headers).is_ok());
//! ```
//!
//! Everything here is synchronous and CPU-bound; nothing awaits.

pub mod clock;
pub mod error;
pub mod fingerprint;
pub mod guard;
pub mod identity;
pub mod origin;
pub mod rate_limit;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SecurityError, SecurityErrorKind, TokenRejection};
pub use fingerprint::{FINGERPRINT_LEN, create_fingerprint};
pub use guard::{IssuedToken, SecurityGuard};
pub use identity::{UNKNOWN_CLIENT, client_identity};
pub use origin::{OriginPolicy, validate_user_agent};
pub use rate_limit::{FixedWindowLimiter, RateLimitPolicy, RateLimitStore, WindowKey};
pub use token::{TOKEN_ISSUER, TOKEN_TTL_SECS, TokenClaims, TokenPayload, TokenService};
