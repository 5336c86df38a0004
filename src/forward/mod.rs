//! Forwarding core.
//!
//! # Data Flow
//! ```text
//! host request
//!     → snapshot.rs (method, path, parameters, headers, body)
//!     → bypass.rs (GET on server root / metadata stays local)
//!     → rewrite.rs (strip prefix, rebuild query, join base URL)
//!     → client.rs (one downstream call, headers.rs filters hop-by-hop)
//!     → relay.rs (status, content type, body onto the host response)
//!
//! On downstream failure:
//!     classify.rs → uniform "Failed to forward request" error
//! ```
//!
//! # Design Decisions
//! - The core never sees axum types beyond `http`; hosts plug in through
//!   `InboundRequest`, `ResponseSink` and `Downstream`
//! - Strictly at-most-once: no retries, no caching
//! - Everything per request is owned by that request; only the HTTP client
//!   and the settings snapshot are shared

pub mod bypass;
pub mod classify;
pub mod client;
pub mod headers;
pub mod interceptor;
pub mod params;
pub mod relay;
pub mod rewrite;
pub mod snapshot;

pub use bypass::BypassPolicy;
pub use client::{
    Downstream, DownstreamFailure, DownstreamResponse, ErrorStatusPolicy, HttpDownstream,
};
pub use interceptor::{Disposition, ForwardSettings, ForwardingInterceptor};
pub use params::QueryParameters;
pub use relay::ResponseSink;
pub use rewrite::{build_forward_target, ForwardTarget, QuerySource};
pub use snapshot::{InboundRequest, RequestSnapshot, TransportKind};
