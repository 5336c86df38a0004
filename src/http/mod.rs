//! HTTP host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware.rs (forwarding interceptor)
//!         ├─ forwarded → inbound.rs adapters → forward/ → relayed response
//!         └─ bypassed  → local.rs (server root, capability statement)
//!     → outcome.rs (OperationOutcome for failures and unknown paths)
//! ```

pub mod inbound;
pub mod local;
pub mod middleware;
pub mod outcome;
pub mod server;

pub use server::HttpServer;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";
