//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Set Request ID  │ ← Generates X-Request-Id if absent
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Propagate Req ID │ ← Copies X-Request-Id onto the response
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Answers every OPTIONS with 200
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Body Limit     │ ← 413 above MAX_REQUEST_BODY_SIZE
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler        ← SecurityGuard runs here (403 / 429 / 401)
//! ```
//!
//! # Routes
//!
//! - `GET /health` - Liveness (no guard)
//! - `POST /api/auth/token` - Session token issuance
//! - `POST /api/assemblyai` - Transcription socket URL
//! - `POST /api/deepl` - Translation relay
//!
//! Any other method on the `/api` routes gets 405.

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use axum::http::{Method, Request};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};

use crate::handlers;
use crate::middleware::{
    REQUEST_ID_HEADER, RequestIdExt, propagate_request_id_layer, set_request_id_layer,
};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    let cors = build_cors_layer(&config.allowed_origins);

    // =========================================================================
    // Build Router with Routes
    // =========================================================================
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/auth/token", post(handlers::issue_token))
        .route(
            "/api/assemblyai",
            post(handlers::create_transcription_session),
        )
        .route("/api/deepl", post(handlers::translate));

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Request body size limit
    info!(
        max_size_bytes = config.max_request_body_size,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    // 2. CORS
    router = router.layer(cors);

    // 3. Tracing, with the request ID in every span
    router = router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = request.request_id().unwrap_or("-"),
        )
    }));

    // 4. Request ID (set runs before propagate)
    router = router
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer());

    router.with_state(state)
}

/// Build CORS layer from the origin allow-list.
///
/// `Access-Control-Allow-Origin` is always the first configured origin, or
/// `*` when the list is empty. It is a static value, not an echo of the
/// caller's origin; enforcement happens in the security guard.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = match allowed_origins.first() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Unusable CORS origin, falling back to *");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([REQUEST_ID_HEADER])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn router(origins: &[&str]) -> Router {
        let config = Config {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            rate_limit_sweep_interval: std::time::Duration::ZERO,
            ..Config::default()
        };
        build_router(AppState::new(config).unwrap())
    }

    async fn preflight(router: Router, path: &str) -> axum::response::Response {
        router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(path)
                    .header("origin", "https://anything.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_uses_first_origin() {
        let response = preflight(
            router(&["https://app.example", "https://other.example"]),
            "/api/deepl",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "https://app.example"
        );
        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("POST") && methods.contains("OPTIONS"));
        let allowed = headers["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("content-type") && allowed.contains("authorization"));
    }

    #[tokio::test]
    async fn test_preflight_wildcard_without_origins() {
        let response = preflight(router(&[]), "/api/assemblyai").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_get_on_relay_route_is_method_not_allowed() {
        let response = router(&["https://app.example"])
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/api/deepl")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_request_id_generated_and_echoed() {
        let response = router(&[])
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let response = router(&[])
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me");
    }
}
