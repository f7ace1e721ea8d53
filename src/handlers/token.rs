use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use tracing::instrument;

use crate::error::AppResult;
use crate::security::IssuedToken;
use crate::state::AppState;

/// `POST /api/auth/token`
///
/// Mints a one-hour bearer token bound to the caller's origin and
/// fingerprint, after the usual origin, user-agent and rate-limit checks.
///
/// ```json
/// { "token": "eyJ...", "expiresIn": 3600, "type": "Bearer" }
/// ```
#[instrument(skip_all)]
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<IssuedToken>> {
    let issued = state.guard.issue_token(&headers)?;
    Ok(Json(issued))
}
