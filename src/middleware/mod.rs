//! HTTP middleware for observability.
//!
//! Security checks are not middleware here: every relay handler calls the
//! [`SecurityGuard`](crate::security::SecurityGuard) itself, so the guard
//! runs before the body is read and only on the routes that need it.
//!
//! ```text
//! Request → Set Request ID → Trace → CORS → Handler → Propagate Request ID → Response
//! ```

pub mod request_id;

pub use request_id::{
    MakeRequestUuidV4, REQUEST_ID_HEADER, RequestIdExt, propagate_request_id_layer,
    set_request_id_layer,
};
