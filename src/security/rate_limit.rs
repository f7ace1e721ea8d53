//! Fixed-window, per-client rate limiting.
//!
//! # Algorithm
//!
//! Time is cut into non-overlapping windows of `window` length. The window
//! index is `floor(now_ms / window_ms)`, and each `(client, window)` pair owns
//! one counter:
//!
//! ```text
//!   window 41            window 42            window 43
//! ├────────────────────┼────────────────────┼────────────────────┤
//!   10.0.0.1 → 30 ✗      10.0.0.1 → 1 ✓
//!   unknown  → 4         unknown  → 12
//! ```
//!
//! A request is admitted while its counter is below `max_requests`. Once the
//! cap is reached further requests are rejected *without* being counted, so a
//! counter never exceeds the cap.
//!
//! # Memory
//!
//! Old windows are dropped by [`FixedWindowLimiter::sweep`], which keeps the
//! current window plus `retained_windows` before it. Sweeps happen two ways:
//! probabilistically on each call (`cleanup_probability`) and from the
//! periodic background task in `AppState`.
//!
//! # Limitations
//!
//! State is process-local. Several instances behind a load balancer each
//! enforce the cap independently.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::http::HeaderMap;
use tracing::{debug, trace};

use super::clock::Clock;
use super::identity::client_identity;

/// Tunables for [`FixedWindowLimiter`].
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitPolicy {
    /// Requests admitted per client per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
    /// Windows kept behind the current one when sweeping.
    pub retained_windows: u64,
    /// Chance in `[0, 1]` that a call also sweeps the store.
    pub cleanup_probability: f64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_millis(60_000),
            retained_windows: 2,
            cleanup_probability: 0.1,
        }
    }
}

impl RateLimitPolicy {
    fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX).max(1)
    }
}

/// Counter key: one client in one window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub client: String,
    pub window: u64,
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.client, self.window)
    }
}

/// Shared counter map.
///
/// Kept separate from the limiter so tests can build isolated stores and
/// inspect them, and so the background sweep can hold a handle.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    counts: Mutex<HashMap<WindowKey, u32>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-updated
    // (every mutation is a single insert/retain), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<WindowKey, u32>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit one request for `key` if its count is below `max`.
    ///
    /// Read, compare and increment happen under one lock acquisition.
    pub fn try_acquire(&self, key: WindowKey, max: u32) -> bool {
        let mut counts = self.lock();
        let count = counts.entry(key).or_insert(0);
        if *count >= max {
            return false;
        }
        *count += 1;
        true
    }

    /// Current count for a client in a window (0 if never seen).
    pub fn count(&self, client: &str, window: u64) -> u32 {
        let key = WindowKey {
            client: client.to_string(),
            window,
        };
        self.lock().get(&key).copied().unwrap_or(0)
    }

    /// Drop every entry whose window is older than `oldest_kept`.
    ///
    /// Returns the number of entries removed.
    pub fn retain_from(&self, oldest_kept: u64) -> usize {
        let mut counts = self.lock();
        let before = counts.len();
        counts.retain(|key, _| key.window >= oldest_kept);
        before - counts.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Fixed-window limiter over an injected store and clock.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    store: Arc<RateLimitStore>,
    clock: Arc<dyn Clock>,
    policy: RateLimitPolicy,
}

impl FixedWindowLimiter {
    pub fn new(store: Arc<RateLimitStore>, clock: Arc<dyn Clock>, policy: RateLimitPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<RateLimitStore> {
        &self.store
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Index of the window containing "now".
    pub fn current_window(&self) -> u64 {
        self.clock.now_millis() / self.policy.window_millis()
    }

    /// Rate-limit the client identified by the request's forwarding headers.
    pub fn check_rate_limit(&self, headers: &HeaderMap) -> bool {
        let client = client_identity(headers);
        self.check(&client)
    }

    /// Count one request from `client`; `false` means the cap was already hit.
    pub fn check(&self, client: &str) -> bool {
        let window = self.current_window();
        let key = WindowKey {
            client: client.to_string(),
            window,
        };
        trace!(key = %key, "Checking rate limit");

        let allowed = self.store.try_acquire(key, self.policy.max_requests);
        crate::metrics::set_rate_limit_entries(self.store.len());
        if !allowed {
            debug!(client, window, max = self.policy.max_requests, "Window quota exhausted");
        }

        if self.policy.cleanup_probability > 0.0
            && rand::random::<f64>() < self.policy.cleanup_probability
        {
            self.sweep_at(window);
        }

        allowed
    }

    /// Remove windows older than the retention horizon.
    pub fn sweep(&self) -> usize {
        self.sweep_at(self.current_window())
    }

    fn sweep_at(&self, current_window: u64) -> usize {
        let oldest_kept = current_window.saturating_sub(self.policy.retained_windows);
        let removed = self.store.retain_from(oldest_kept);
        let remaining = self.store.len();
        if removed > 0 {
            debug!(removed, remaining, oldest_kept, "Swept expired rate-limit windows");
        }
        crate::metrics::set_rate_limit_entries(remaining);
        removed
    }
}
