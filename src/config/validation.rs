//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the downstream URL, prefix and bypass paths
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::forward::bypass::default_bypass_paths;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("forwarding.backend_url must be set")]
    MissingBackendUrl,

    #[error("forwarding.backend_url '{url}' is invalid: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("forwarding.strip_prefix '{0}' must be empty or start with '/' and not end with '/'")]
    InvalidStripPrefix(String),

    #[error("forwarding.bypass_paths entry '{0}' must start with '/'")]
    InvalidBypassPath(String),

    #[error("forwarding.bypass_paths entry '{0}' has no local endpoint")]
    UnservedBypassPath(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let forwarding = &config.forwarding;
    if forwarding.backend_url.trim().is_empty() {
        errors.push(ValidationError::MissingBackendUrl);
    } else if let Err(reason) = check_backend_url(&forwarding.backend_url) {
        errors.push(ValidationError::InvalidBackendUrl {
            url: forwarding.backend_url.clone(),
            reason,
        });
    }

    let prefix = &forwarding.strip_prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        errors.push(ValidationError::InvalidStripPrefix(prefix.clone()));
    }

    // Bypassed requests land on the local routes, which only exist for the
    // prefix-derived paths.
    let served = default_bypass_paths(prefix);
    for path in forwarding.bypass_paths.iter().flatten() {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidBypassPath(path.clone()));
        } else if !served.contains(path) {
            errors.push(ValidationError::UnservedBypassPath(path.clone()));
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.downstream_secs", timeouts.downstream_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
