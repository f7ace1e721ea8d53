use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Translation request accepted by `POST /api/deepl`.
///
/// Every field is optional at the wire level so a missing field yields the
/// relay's own 400 message rather than a serde error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
    #[serde(default)]
    pub source_lang: Option<String>,
}

/// A translation request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateParams {
    pub text: String,
    pub target_lang: String,
    pub source_lang: Option<String>,
}

/// One translated segment as returned by DeepL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_source_language: Option<String>,
    pub text: String,
}

/// Upstream DeepL response body.
#[derive(Debug, Clone, Deserialize)]
pub struct DeepLResponse {
    #[serde(default)]
    pub translations: Vec<Translation>,
}

/// Response body of `POST /api/deepl`.
#[derive(Debug, Clone, Serialize)]
pub struct TranslateResponse {
    pub translations: Vec<Translation>,
    /// Detected language of the first segment, if DeepL reported one.
    pub source_lang: Option<String>,
    pub provider: &'static str,
}

/// Response body of `POST /api/assemblyai`.
///
/// ```json
/// {
///   "wsUrl": "wss://api.assemblyai.com/v2/realtime/ws?sample_rate=16000&token=...",
///   "expiresAt": "2025-01-15T11:30:00.000Z",
///   "provider": "assemblyai"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionSession {
    pub ws_url: String,
    pub expires_at: String,
    pub provider: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    /// Live (client, window) counters in the rate limiter.
    pub rate_limit_entries: usize,
}
