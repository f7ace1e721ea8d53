//! # relay_guard
//!
//! A security gate and thin relay in front of third-party speech
//! transcription (AssemblyAI) and translation (DeepL) APIs. Provider keys
//! stay on the server; browsers get short-lived access instead.
//!
//! - **Provenance**: `Origin` allow-list with `Referer` prefix fallback, plus
//!   a browser user-agent check
//! - **Throttling**: fixed-window rate limit per client (30 / 60 s default)
//! - **Sessions**: HS256 bearer tokens bound to origin and fingerprint
//! - **Observability**: request IDs, structured logging, Prometheus metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → Trace → CORS → Body Limit)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, token, assemblyai, deepl)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SecurityGuard (origin → user agent → rate limit → token)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Relays (TranscriptionRelay, DeepLClient)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_guard::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = build_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Security Configuration
//!
//! ```bash
//! ALLOWED_ORIGINS=https://app.example.com JWT_SECRET=change-me cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod relay;
pub mod routes;
pub mod security;
pub mod state;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use security::SecurityGuard;
pub use state::AppState;
