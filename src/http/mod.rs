//! HTTP surface of the pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware/logging.rs (buffer small request bodies)
//!     → middleware/track.rs (start latency clock)
//!     → host route handler
//!     → capture.rs (observe the response body as it streams)
//!     → completion: latency recorded, log record enqueued
//! ```

pub mod capture;
pub mod middleware;
pub mod server;

pub use middleware::{log_requests, track_requests, X_REQUEST_ID};
pub use server::HttpServer;
