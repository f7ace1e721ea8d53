//! Shared application state for Axum handlers.
//!
//! Holds everything built once at startup:
//!
//! - **Configuration**: read-only, behind `Arc`
//! - **Security guard**: origin policy, rate limiter and token service
//! - **Relays**: AssemblyAI session builder and DeepL client
//!
//! # Structured Concurrency
//!
//! The rate-limit sweep runs as a background task managed by
//! `tokio_util::task::TaskTracker` and a `CancellationToken`. Call
//! `shutdown()` to stop it before exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::error::AppResult;
use crate::relay::{DeepLClient, TranscriptionRelay};
use crate::security::{
    Clock, FixedWindowLimiter, OriginPolicy, RateLimitStore, SecurityGuard, SystemClock,
    TokenService,
};

/// Shared application state for Axum handlers.
///
/// Cloned per request; every field is cheap to clone.
///
/// # Lifecycle
///
/// ```rust,ignore
/// let state = AppState::new(config)?;
/// // ... serve ...
/// state.shutdown().await;  // Stop the sweep task
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Request gate shared by every relay endpoint
    pub guard: SecurityGuard,
    /// AssemblyAI socket URL builder
    pub transcription: TranscriptionRelay,
    /// DeepL translate client
    pub deepl: DeepLClient,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Tracks spawned background tasks for graceful shutdown
    task_tracker: TaskTracker,
    /// Cancellation token for signaling background tasks to stop
    cancellation_token: CancellationToken,
}

impl AppState {
    /// Create application state using the system clock.
    ///
    /// Spawns the rate-limit sweep task when
    /// `RATE_LIMIT_SWEEP_INTERVAL_SECS > 0`, so this must run inside a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// `AppError::ConfigError` if an upstream URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create application state with an injected clock.
    ///
    /// # Errors
    ///
    /// Same as [`AppState::new`].
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let transcription = TranscriptionRelay::new(&config)?;
        let deepl = DeepLClient::new(&config)?;

        let limiter = FixedWindowLimiter::new(
            Arc::new(RateLimitStore::new()),
            Arc::clone(&clock),
            config.rate_limit_policy(),
        );
        let guard = SecurityGuard::new(
            OriginPolicy::new(&config.allowed_origins),
            limiter,
            TokenService::new(config.jwt_secret.as_deref()),
            clock,
        );

        let state = Self {
            config: Arc::new(config),
            guard,
            transcription,
            deepl,
            started_at: Instant::now(),
            task_tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
        };

        if state.config.sweep_enabled() {
            state.spawn_rate_limit_sweep_task(state.config.rate_limit_sweep_interval);
        }

        Ok(state)
    }

    /// Spawn the periodic rate-limit sweep.
    ///
    /// Only the limiter is moved into the task, not the whole state.
    fn spawn_rate_limit_sweep_task(&self, period: Duration) {
        let limiter = self.guard.limiter().clone();
        let cancel = self.cancellation_token.clone();

        self.task_tracker.spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    biased; // Check cancellation first

                    _ = cancel.cancelled() => {
                        debug!("Rate-limit sweep task received cancellation signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        trace!(removed, remaining = limiter.store().len(), "Rate-limit sweep");
                    }
                }
            }

            debug!("Rate-limit sweep task shutting down");
        });
    }

    /// Gracefully shutdown all background tasks.
    ///
    /// 1. Signals all tasks to stop via cancellation token
    /// 2. Closes the task tracker (prevents new tasks)
    /// 3. Waits for all tasks to complete
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown of background tasks");

        self.cancellation_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("All background tasks have completed");
    }

    /// Number of background tasks still running.
    pub fn background_tasks(&self) -> usize {
        self.task_tracker.len()
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::security::ManualClock;
    use axum::http::{HeaderMap, HeaderValue};

    #[tokio::test]
    async fn test_sweep_task_lifecycle() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.background_tasks(), 1);

        state.shutdown().await;
        assert_eq!(state.background_tasks(), 0);
    }

    #[tokio::test]
    async fn test_sweep_disabled() {
        let config = Config {
            rate_limit_sweep_interval: Duration::ZERO,
            ..Config::default()
        };
        let state = AppState::new(config).unwrap();
        assert_eq!(state.background_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_evicts_old_windows() {
        let clock = ManualClock::new(0);
        let config = Config {
            allowed_origins: vec!["https://allowed.example".to_string()],
            rate_limit_cleanup_probability: 0.0,
            rate_limit_sweep_interval: Duration::from_secs(60),
            ..Config::default()
        };
        let state = AppState::with_clock(config, Arc::new(clock.clone())).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("origin", HeaderValue::from_static("https://allowed.example"));
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));
        state.guard.validate_request(&headers).unwrap();
        assert_eq!(state.guard.limiter().store().len(), 1);

        // Three windows later the entry is outside the retained range.
        clock.advance(Duration::from_secs(180));
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(state.guard.limiter().store().len(), 0);
        state.shutdown().await;
    }
}
