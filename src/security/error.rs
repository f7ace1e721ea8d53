use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

/// Why a bearer token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// `exp` is in the past.
    Expired,
    /// Signature does not match the configured secret.
    BadSignature,
    /// Not a decodable JWT, or signed with an unexpected algorithm.
    Malformed,
    /// Decodable and signed, but a required claim is missing or wrong.
    InvalidClaims,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenRejection::Expired => "token expired",
            TokenRejection::BadSignature => "invalid signature",
            TokenRejection::Malformed => "malformed token",
            TokenRejection::InvalidClaims => "invalid claims",
        })
    }
}

impl From<&jsonwebtoken::errors::Error> for TokenRejection {
    fn from(err: &jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            ErrorKind::InvalidSignature => TokenRejection::BadSignature,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => TokenRejection::InvalidClaims,
            _ => TokenRejection::Malformed,
        }
    }
}

/// Failures raised by the security core.
///
/// Callers choose a response by [`SecurityError::kind`], never by message text.
#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("Invalid origin")]
    InvalidOrigin,

    #[error("Invalid user agent")]
    InvalidUserAgent,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid token: {reason}")]
    InvalidToken {
        reason: TokenRejection,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("{0}")]
    Configuration(String),
}

/// Coarse classification used for status-code selection and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityErrorKind {
    /// Origin or user-agent check failed.
    Origin,
    RateLimit,
    InvalidToken,
    Configuration,
}

impl SecurityErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityErrorKind::Origin => "origin",
            SecurityErrorKind::RateLimit => "rate_limit",
            SecurityErrorKind::InvalidToken => "invalid_token",
            SecurityErrorKind::Configuration => "configuration",
        }
    }
}

impl SecurityError {
    pub fn kind(&self) -> SecurityErrorKind {
        match self {
            SecurityError::InvalidOrigin | SecurityError::InvalidUserAgent => {
                SecurityErrorKind::Origin
            }
            SecurityError::RateLimitExceeded => SecurityErrorKind::RateLimit,
            SecurityError::InvalidToken { .. } => SecurityErrorKind::InvalidToken,
            SecurityError::Configuration(_) => SecurityErrorKind::Configuration,
        }
    }

    pub(crate) fn invalid_token(source: jsonwebtoken::errors::Error) -> Self {
        SecurityError::InvalidToken {
            reason: TokenRejection::from(&source),
            source,
        }
    }
}
