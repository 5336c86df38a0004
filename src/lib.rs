//! FHIR forwarding relay library.
//!
//! Intercepts requests arriving at a FHIR server front end and forwards
//! them to a single downstream API, serving only the server root and the
//! capability statement locally.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use error::ForwardError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
