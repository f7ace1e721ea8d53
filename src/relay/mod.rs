//! Upstream provider relays.
//!
//! Each relay holds its provider key server-side and turns a validated
//! request into exactly one upstream interaction:
//!
//! - [`TranscriptionRelay`]: hands out an AssemblyAI real-time socket URL
//!   (no network call)
//! - [`DeepLClient`]: forwards a translation as a form POST
//!
//! Neither retries. A non-success upstream status becomes
//! [`AppError::Upstream`](crate::error::AppError::Upstream).

pub mod assemblyai;
pub mod deepl;

pub use assemblyai::TranscriptionRelay;
pub use deepl::DeepLClient;
