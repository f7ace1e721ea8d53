//! Signed session tokens.
//!
//! Tokens are HS256 JWTs binding the caller's origin and fingerprint. They
//! are verified statelessly: there is no session store and no revocation, a
//! token dies only when `exp` passes.
//!
//! ```text
//! { "origin": "https://app.example.com",
//!   "fingerprint": "TW96aWxsYS81LjAg",
//!   "iat": 1760000000, "exp": 1760003600, "iss": "relay-guard" }
//! ```

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::SecurityError;

/// Issuer claim stamped on and required of every token.
pub const TOKEN_ISSUER: &str = "relay-guard";

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: u64 = 3600;

/// Scheme reported to clients alongside the token.
pub const TOKEN_TYPE: &str = "Bearer";

const MISSING_SECRET: &str = "JWT_SECRET not configured";

/// What the caller asks to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    pub origin: String,
    pub fingerprint: String,
    /// Seconds since the Unix epoch.
    pub issued_at: u64,
}

/// Claims carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub origin: String,
    pub fingerprint: String,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies tokens under a single shared secret.
///
/// Built without a secret the service still exists, but every call fails
/// with a configuration error. A missing secret is surfaced per request, not
/// at startup.
#[derive(Clone)]
pub struct TokenService {
    keys: Option<Arc<SigningKeys>>,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl TokenService {
    /// Create a service; `None` or an empty secret leaves it unconfigured.
    pub fn new(secret: Option<&str>) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| {
            Arc::new(SigningKeys {
                encoding: EncodingKey::from_secret(s.as_bytes()),
                decoding: DecodingKey::from_secret(s.as_bytes()),
            })
        });

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self { keys, validation }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    fn keys(&self) -> Result<&SigningKeys, SecurityError> {
        self.keys
            .as_deref()
            .ok_or_else(|| SecurityError::Configuration(MISSING_SECRET.to_string()))
    }

    /// Sign `payload` with a one-hour expiry and the fixed issuer.
    ///
    /// # Errors
    ///
    /// `SecurityError::Configuration` when no secret is configured.
    pub fn generate_token(&self, payload: &TokenPayload) -> Result<String, SecurityError> {
        let keys = self.keys()?;
        let claims = TokenClaims {
            origin: payload.origin.clone(),
            fingerprint: payload.fingerprint.clone(),
            iat: payload.issued_at,
            exp: payload.issued_at.saturating_add(TOKEN_TTL_SECS),
            iss: TOKEN_ISSUER.to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| SecurityError::Configuration(format!("Failed to sign token: {e}")))?;

        debug!(origin = %claims.origin, exp = claims.exp, "Issued session token");
        Ok(token)
    }

    /// Verify signature, issuer and expiry, returning the claims.
    ///
    /// Expiry is exclusive of `exp` itself: a token is still accepted during
    /// the second equal to `exp` and rejected from `exp + 1` on, one second
    /// later than a `now >= exp` rule would.
    ///
    /// # Errors
    ///
    /// - `SecurityError::Configuration` when no secret is configured
    /// - `SecurityError::InvalidToken` for expired, forged or malformed tokens
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, SecurityError> {
        let keys = self.keys()?;
        jsonwebtoken::decode::<TokenClaims>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(SecurityError::invalid_token)
    }
}
