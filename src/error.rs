use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::security::{SecurityError, SecurityErrorKind};

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Security Errors
///
/// Rejections from the security core arrive as [`AppError::Security`] and are
/// mapped by [`SecurityErrorKind`], never by message text:
///
/// - `Origin` (bad origin or user agent) - 403
/// - `RateLimit` - 429
/// - `InvalidToken` - 401
/// - `Configuration` (no signing secret) - 500
///
/// # Upstream Errors
///
/// - `Upstream` - provider answered with a non-success status (502)
/// - `UpstreamUnavailable` - provider could not be reached (502)
/// - `OperationTimeout` - provider did not answer in time (504)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{provider} responded with status {status}")]
    Upstream { provider: &'static str, status: u16 },

    #[error("{provider} unreachable: {reason}")]
    UpstreamUnavailable {
        provider: &'static str,
        reason: String,
    },

    #[error("Operation timed out: {0}")]
    OperationTimeout(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Security(e) => match e.kind() {
                SecurityErrorKind::Origin => StatusCode::FORBIDDEN,
                SecurityErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                SecurityErrorKind::InvalidToken => StatusCode::UNAUTHORIZED,
                SecurityErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) | AppError::SerializationError(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } | AppError::UpstreamUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::OperationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log the full error details server-side for debugging
        // but only expose sanitized messages to clients
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let (error_type, message) = match &self {
            AppError::Security(e) => match e.kind() {
                SecurityErrorKind::Origin => ("forbidden", "Forbidden"),
                SecurityErrorKind::RateLimit => ("too_many_requests", "Too many requests"),
                SecurityErrorKind::InvalidToken => ("invalid_token", "Invalid or expired token"),
                // Missing signing secret - never echo configuration details
                SecurityErrorKind::Configuration => {
                    ("internal_error", "Internal server error")
                }
            },

            // Upstream errors - the provider's body is never forwarded
            AppError::Upstream { provider, .. } => ("upstream_error", upstream_message(provider)),
            AppError::UpstreamUnavailable { .. } => (
                "upstream_unavailable",
                "Upstream service is temporarily unavailable. Please try again.",
            ),

            // Timeout errors - client can retry
            AppError::OperationTimeout(_) => ("timeout", "Operation timed out. Please try again."),

            // Internal errors - never expose internal details to clients
            AppError::ConfigError(_) => ("internal_error", "Internal server error"),

            // Client errors - safe to show the message as it's user-facing
            AppError::SerializationError(e) => {
                // Serde errors can be helpful for clients debugging their payload
                // but sanitize to avoid leaking internal type names
                let sanitized = sanitize_serde_error(e);
                return (
                    status,
                    axum::Json(ErrorResponse {
                        error: "serialization_error".to_string(),
                        message: sanitized,
                        details: None,
                    }),
                )
                    .into_response();
            }
            AppError::BadRequest(msg) => ("bad_request", msg.as_str()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: message.to_string(),
            details: None, // Never expose internal details to clients
        };

        (status, axum::Json(body)).into_response()
    }
}

fn upstream_message(provider: &str) -> &'static str {
    match provider {
        "deepl" => "Translation service error",
        "assemblyai" => "Transcription service error",
        _ => "Upstream service error",
    }
}

/// Sanitize serde error messages to avoid leaking internal type information.
///
/// Serde errors can contain internal struct/field names which shouldn't be
/// exposed to external clients. This function extracts the useful parts.
fn sanitize_serde_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if msg.contains("EOF while parsing") || msg.contains("expected") {
        return "Malformed JSON in request body".to_string();
    }

    // Generic fallback that doesn't leak internal details
    "Invalid request format".to_string()
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::TranslateRequest;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_security_errors_map_by_kind() {
        let (status, body) = body_json(SecurityError::InvalidOrigin.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "Forbidden");

        let (status, _) = body_json(SecurityError::InvalidUserAgent.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = body_json(SecurityError::RateLimitExceeded.into()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["message"], "Too many requests");
    }

    #[tokio::test]
    async fn test_missing_secret_is_sanitized() {
        let err: AppError = SecurityError::Configuration("JWT_SECRET not configured".into()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("JWT_SECRET"));
    }

    #[tokio::test]
    async fn test_upstream_status_is_bad_gateway() {
        let (status, body) = body_json(AppError::Upstream {
            provider: "deepl",
            status: 456,
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_error");
        assert_eq!(body["message"], "Translation service error");
    }

    #[tokio::test]
    async fn test_bad_request_message_is_client_facing() {
        let (status, body) =
            body_json(AppError::BadRequest("Missing required parameters: text".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required parameters: text");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_timeout_and_config_status() {
        assert_eq!(
            AppError::OperationTimeout("deepl".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::ConfigError("DEEPL_API_KEY not configured".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_sanitize_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(sanitize_serde_error(&err), "Malformed JSON in request body");

        // Absent fields are left to validation, so only shape errors reach here.
        assert!(serde_json::from_str::<TranslateRequest>("{}").is_ok());

        let err = serde_json::from_str::<TranslateRequest>(r#"{"text": 5}"#).unwrap_err();
        assert_eq!(sanitize_serde_error(&err), "Invalid data type in request body");
        assert!(!sanitize_serde_error(&err).contains("TranslateRequest"));
    }
}
