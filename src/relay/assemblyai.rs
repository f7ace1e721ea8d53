use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::Url;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::TranscriptionSession;

pub const PROVIDER: &str = "assemblyai";

/// How long a handed-out socket URL is advertised as valid.
pub const SESSION_TTL_SECS: i64 = 3600;

/// Builds AssemblyAI real-time socket URLs carrying the server-side key.
#[derive(Clone)]
pub struct TranscriptionRelay {
    realtime_url: Url,
    sample_rate: u32,
    api_key: Option<Arc<str>>,
}

impl fmt::Debug for TranscriptionRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionRelay")
            .field("realtime_url", &self.realtime_url.as_str())
            .field("sample_rate", &self.sample_rate)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

impl TranscriptionRelay {
    /// # Errors
    ///
    /// `AppError::ConfigError` if the socket URL does not parse.
    pub fn new(config: &Config) -> AppResult<Self> {
        let realtime_url = Url::parse(&config.assemblyai_realtime_url).map_err(|e| {
            AppError::ConfigError(format!("Invalid ASSEMBLYAI_REALTIME_URL: {e}"))
        })?;

        Ok(Self {
            realtime_url,
            sample_rate: config.assemblyai_sample_rate,
            api_key: config.assemblyai_api_key.as_deref().map(Arc::from),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build a session descriptor valid for one hour from `now`.
    ///
    /// The key is percent-encoded into the `token` query parameter.
    ///
    /// # Errors
    ///
    /// `AppError::ConfigError` when `ASSEMBLYAI_API_KEY` is unset.
    pub fn create_session(&self, now: DateTime<Utc>) -> AppResult<TranscriptionSession> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("ASSEMBLYAI_API_KEY not configured".into()))?;

        let mut ws_url = self.realtime_url.clone();
        ws_url
            .query_pairs_mut()
            .append_pair("sample_rate", &self.sample_rate.to_string())
            .append_pair("token", api_key);

        let expires_at = (now + TimeDelta::seconds(SESSION_TTL_SECS))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        debug!(expires_at = %expires_at, "Transcription session created");

        Ok(TranscriptionSession {
            ws_url: ws_url.into(),
            expires_at,
            provider: PROVIDER,
        })
    }
}
