//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::forward::bypass::default_bypass_paths;
use crate::forward::client::ErrorStatusPolicy;
use crate::forward::rewrite::QuerySource;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Downstream target and rewrite rules.
    pub forwarding: ForwardingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Locally served FHIR endpoints (server root, capability statement).
    pub server: ServerInfoConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Downstream base URL (e.g., "https://backend.example"). Required.
    pub backend_url: String,

    /// Path prefix removed before forwarding.
    pub strip_prefix: String,

    /// GET paths served locally. Derived from `strip_prefix` when unset.
    ///
    /// Only a subset of the derived paths is accepted: the local endpoints
    /// are `/`, the prefix root and `<prefix>/metadata`. They are mounted
    /// for the prefix in effect at startup; a reload changing
    /// `strip_prefix` is rejected.
    pub bypass_paths: Option<Vec<String>>,

    /// Source of the forwarded query string.
    pub query_source: QuerySource,

    /// Whether downstream 4xx/5xx are relayed or reported as failures.
    pub error_status_policy: ErrorStatusPolicy,
}

impl ForwardingConfig {
    /// Bypass paths after applying the prefix-derived default.
    pub fn effective_bypass_paths(&self) -> Vec<String> {
        match &self.bypass_paths {
            Some(paths) => paths.clone(),
            None => default_bypass_paths(&self.strip_prefix),
        }
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            strip_prefix: "/fhir".to_string(),
            bypass_paths: None,
            query_source: QuerySource::Decoded,
            error_status_policy: ErrorStatusPolicy::Relay,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Downstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Downstream call timeout (send + full response body) in seconds.
    pub downstream_secs: u64,

    /// Inbound request timeout (total handling time) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            downstream_secs: 60,
            request_secs: 90,
        }
    }
}

/// Identity reported by the locally served endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerInfoConfig {
    /// Software name in the capability statement.
    pub software_name: String,

    /// FHIR version advertised in the capability statement.
    pub fhir_version: String,
}

impl Default for ServerInfoConfig {
    fn default() -> Self {
        Self {
            software_name: "fhir-relay".to_string(),
            fhir_version: "4.0.1".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}
