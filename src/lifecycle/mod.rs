//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Install diagnostics → Telemetry::start → Bind listener
//!
//! Shutdown:
//!     signals.rs (SIGTERM/SIGINT) → server drains
//!     → Telemetry::shutdown → shutdown.rs broadcast → publisher and shipper exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
