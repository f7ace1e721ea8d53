//! Provider relay endpoints.
//!
//! Both handlers run [`SecurityGuard::authorize`](crate::security::SecurityGuard::authorize)
//! before touching configuration or the request body, so a rejected caller
//! learns nothing beyond the rejection itself.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use tracing::{info, instrument};

use crate::error::AppResult;
use crate::models::{TranscriptionSession, TranslateRequest, TranslateResponse};
use crate::state::AppState;
use crate::validation::validate_translate_request;

/// `POST /api/assemblyai`
///
/// Returns a real-time socket URL carrying the server's AssemblyAI key.
#[instrument(skip_all)]
pub async fn create_transcription_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<TranscriptionSession>> {
    state.guard.authorize(&headers)?;

    let session = state.transcription.create_session(Utc::now())?;
    info!(expires_at = %session.expires_at, "Issued transcription session");

    Ok(Json(session))
}

/// `POST /api/deepl`
///
/// Body: `{ "text": "...", "target_lang": "EN", "source_lang": "DE" }`
/// (`source_lang` optional). The body is taken as raw bytes and parsed only
/// after the guard passes.
#[instrument(skip_all)]
pub async fn translate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<TranslateResponse>> {
    state.guard.authorize(&headers)?;
    state.deepl.ensure_configured()?;

    let request: TranslateRequest = if body.is_empty() {
        TranslateRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let params = validate_translate_request(request, state.config.max_text_length)?;

    let response = state.deepl.translate(&params).await?;
    Ok(Json(response))
}
