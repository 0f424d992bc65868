//! Telemetry middleware for the host router.
//!
//! Both functions are plain axum middleware, installed with
//! `axum::middleware::from_fn_with_state`, and may be stacked in either
//! order. Each calls `next.run` exactly once.

pub mod logging;
pub mod track;

pub use logging::{log_requests, X_REQUEST_ID};
pub use track::track_requests;
