//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables (or a `.env` file)
//! with development-friendly defaults.
//!
//! # Security Configuration
//!
//! - `ALLOWED_ORIGINS`: Comma-separated origins allowed to call the relay.
//!   Empty means nothing is allowed.
//! - `JWT_SECRET`: Token signing secret. Missing is not a startup error; the
//!   token endpoint and bearer verification fail per request instead.
//!
//! # Upstream Providers
//!
//! - `ASSEMBLYAI_API_KEY`, `ASSEMBLYAI_REALTIME_URL`, `ASSEMBLYAI_SAMPLE_RATE`
//! - `DEEPL_API_KEY`, `DEEPL_API_URL`, `UPSTREAM_TIMEOUT_SECS`
//!
//! # Rate Limiting
//!
//! - `RATE_LIMIT_MAX_REQUESTS`: Requests per client per window (default: 30)
//! - `RATE_LIMIT_WINDOW_MS`: Window length (default: 60000)
//! - `RATE_LIMIT_RETAINED_WINDOWS`: Windows kept when sweeping (default: 2)
//! - `RATE_LIMIT_CLEANUP_PROBABILITY`: Per-request sweep chance (default: 0.1)
//! - `RATE_LIMIT_SWEEP_INTERVAL_SECS`: Background sweep period, 0 = off (default: 60)

use std::env;
use std::time::Duration;

use reqwest::Url;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};
use crate::security::RateLimitPolicy;

/// Default AssemblyAI real-time socket endpoint.
pub const DEFAULT_ASSEMBLYAI_REALTIME_URL: &str = "wss://api.assemblyai.com/v2/realtime/ws";

/// Default DeepL translate endpoint (free tier).
pub const DEFAULT_DEEPL_API_URL: &str = "https://api-free.deepl.com/v2/translate";

/// Output format for tracing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Built once at startup and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Maximum request body size in bytes (default: 1MB)
    pub max_request_body_size: usize,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Origins permitted to call the relay, in configuration order.
    /// The first entry is also echoed as `Access-Control-Allow-Origin`.
    pub allowed_origins: Vec<String>,

    /// HS256 signing secret for session tokens
    pub jwt_secret: Option<String>,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Requests admitted per client per window (default: 30)
    pub rate_limit_max_requests: u32,

    /// Fixed window length (default: 60s)
    pub rate_limit_window: Duration,

    /// Windows retained behind the current one (default: 2)
    pub rate_limit_retained_windows: u64,

    /// Per-request probability of sweeping old windows (default: 0.1)
    pub rate_limit_cleanup_probability: f64,

    /// Background sweep interval, zero disables (default: 60s)
    pub rate_limit_sweep_interval: Duration,

    // =========================================================================
    // Upstream Provider Configuration
    // =========================================================================
    /// AssemblyAI API key (transcription relay returns 500 without it)
    pub assemblyai_api_key: Option<String>,

    /// AssemblyAI real-time WebSocket base URL
    pub assemblyai_realtime_url: String,

    /// Audio sample rate advertised in the socket URL (default: 16000)
    pub assemblyai_sample_rate: u32,

    /// DeepL API key (translation relay returns 500 without it)
    pub deepl_api_key: Option<String>,

    /// DeepL translate endpoint
    pub deepl_api_url: String,

    /// Timeout for a single upstream call (default: 10s)
    pub upstream_timeout: Duration,

    /// Maximum translation text size in bytes (default: 50000)
    pub max_text_length: usize,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level filter (e.g., "info", "debug", "relay_guard=trace")
    pub log_level: String,

    /// Log output format (default: pretty)
    pub log_format: LogFormat,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a value fails to parse or the
    /// resulting configuration is inconsistent.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?,

            // Security
            allowed_origins: Self::parse_list("ALLOWED_ORIGINS"),
            jwt_secret: Self::optional_env("JWT_SECRET"),

            // Rate limiting
            rate_limit_max_requests: Self::parse_env("RATE_LIMIT_MAX_REQUESTS", 30)?,
            rate_limit_window: Duration::from_millis(Self::parse_env(
                "RATE_LIMIT_WINDOW_MS",
                60_000,
            )?),
            rate_limit_retained_windows: Self::parse_env("RATE_LIMIT_RETAINED_WINDOWS", 2)?,
            rate_limit_cleanup_probability: Self::parse_env(
                "RATE_LIMIT_CLEANUP_PROBABILITY",
                0.1,
            )?,
            rate_limit_sweep_interval: Duration::from_secs(Self::parse_env(
                "RATE_LIMIT_SWEEP_INTERVAL_SECS",
                60,
            )?),

            // Upstream providers
            assemblyai_api_key: Self::optional_env("ASSEMBLYAI_API_KEY"),
            assemblyai_realtime_url: env::var("ASSEMBLYAI_REALTIME_URL")
                .unwrap_or_else(|_| DEFAULT_ASSEMBLYAI_REALTIME_URL.to_string()),
            assemblyai_sample_rate: Self::parse_env("ASSEMBLYAI_SAMPLE_RATE", 16_000)?,
            deepl_api_key: Self::optional_env("DEEPL_API_KEY"),
            deepl_api_url: env::var("DEEPL_API_URL")
                .unwrap_or_else(|_| DEFAULT_DEEPL_API_URL.to_string()),
            upstream_timeout: Duration::from_secs(Self::parse_env("UPSTREAM_TIMEOUT_SECS", 10)?),
            max_text_length: Self::parse_env("MAX_TEXT_LENGTH", 50_000)?,

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: Self::parse_env("LOG_FORMAT", LogFormat::Pretty)?,
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.rate_limit_max_requests == 0 {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_MAX_REQUESTS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_window.is_zero() {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_WINDOW_MS must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rate_limit_cleanup_probability) {
            return Err(AppError::ConfigError(format!(
                "RATE_LIMIT_CLEANUP_PROBABILITY must be within [0, 1] (got {})",
                self.rate_limit_cleanup_probability
            )));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.max_text_length == 0 {
            return Err(AppError::ConfigError(
                "MAX_TEXT_LENGTH must be greater than 0".to_string(),
            ));
        }

        if self.assemblyai_sample_rate == 0 {
            return Err(AppError::ConfigError(
                "ASSEMBLYAI_SAMPLE_RATE must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("ASSEMBLYAI_REALTIME_URL", &self.assemblyai_realtime_url),
            ("DEEPL_API_URL", &self.deepl_api_url),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::ConfigError(format!("Invalid {name} '{value}': {e}")))?;
        }

        EnvFilter::try_new(&self.log_level).map_err(|e| {
            AppError::ConfigError(format!("Invalid RUST_LOG '{}': {e}", self.log_level))
        })?;

        Ok(())
    }

    /// Tracing filter built from `log_level`.
    ///
    /// Falls back to `info` when the directive does not parse, which only
    /// happens for a config that skipped [`validate`](Self::validate).
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rate-limit tunables for the security core.
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests: self.rate_limit_max_requests,
            window: self.rate_limit_window,
            retained_windows: self.rate_limit_retained_windows,
            cleanup_probability: self.rate_limit_cleanup_probability,
        }
    }

    /// Check if token issuance and verification can work.
    pub fn tokens_enabled(&self) -> bool {
        self.jwt_secret.is_some()
    }

    /// Check if the background rate-limit sweep should run.
    pub fn sweep_enabled(&self) -> bool {
        !self.rate_limit_sweep_interval.is_zero()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Read a secret-like variable; empty counts as unset.
    fn optional_env(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.trim().is_empty())
    }

    /// Parse a comma-separated list, trimming entries and dropping blanks.
    fn parse_list(name: &str) -> Vec<String> {
        env::var(name)
            .map(|raw| split_list(&raw))
            .unwrap_or_default()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_request_body_size: 1024 * 1024,
            // Security
            allowed_origins: Vec::new(),
            jwt_secret: None,
            // Rate limiting
            rate_limit_max_requests: 30,
            rate_limit_window: Duration::from_millis(60_000),
            rate_limit_retained_windows: 2,
            rate_limit_cleanup_probability: 0.1,
            rate_limit_sweep_interval: Duration::from_secs(60),
            // Upstream providers
            assemblyai_api_key: None,
            assemblyai_realtime_url: DEFAULT_ASSEMBLYAI_REALTIME_URL.to_string(),
            assemblyai_sample_rate: 16_000,
            deepl_api_key: None,
            deepl_api_url: DEFAULT_DEEPL_API_URL.to_string(),
            upstream_timeout: Duration::from_secs(10),
            max_text_length: 50_000,
            // Observability
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: 9090,
        }
    }
}
