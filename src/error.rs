//! Error types for the forwarding path.

use thiserror::Error;

use crate::forward::classify::classify;
use crate::forward::client::DownstreamFailure;

/// Result type alias for forwarding operations.
pub type Result<T> = std::result::Result<T, ForwardError>;

/// Errors raised while intercepting and forwarding one request.
///
/// Callers only ever see [`ForwardError::Failed`]; the other variants are
/// folded into it by [`ForwardError::into_forwarding_failure`] once they have
/// been logged.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The inbound exchange is not a plain HTTP request (upgrade, tunnel).
    #[error("Not a forwardable HTTP request: {0}")]
    BadRequestKind(String),

    /// Method name does not map to a known HTTP verb.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The inbound body could not be read, or was already consumed.
    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    /// The downstream call failed or answered with a rejected status.
    #[error(transparent)]
    Downstream(#[from] DownstreamFailure),

    /// Writing the relayed response back to the caller failed.
    #[error("Failed to write response: {0}")]
    RelayWrite(String),

    /// Uniform caller-facing failure carrying a sanitized message.
    #[error("Failed to forward request: {message}")]
    Failed { message: String },
}

impl ForwardError {
    /// Fold any error into the single caller-facing `Failed` variant.
    ///
    /// Downstream failures go through the classifier so credentials-related
    /// bodies never reach the caller.
    pub fn into_forwarding_failure(self) -> Self {
        match self {
            Self::Failed { .. } => self,
            Self::Downstream(failure) => Self::Failed {
                message: classify(&failure),
            },
            other => Self::Failed {
                message: other.to_string(),
            },
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequestKind(_) => "bad_request_kind",
            Self::UnsupportedMethod(_) => "unsupported_method",
            Self::BodyRead(_) => "body_read",
            Self::Downstream(DownstreamFailure::Http { .. }) => "downstream_http",
            Self::Downstream(DownstreamFailure::Transport { .. }) => "downstream_transport",
            Self::RelayWrite(_) => "relay_write",
            Self::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_unauthorized_is_sanitized() {
        let err = ForwardError::from(DownstreamFailure::Http {
            status: StatusCode::UNAUTHORIZED,
            raw_body: r#"{"error":"bad token"}"#.into(),
        });

        let failure = err.into_forwarding_failure();
        let text = failure.to_string();

        assert_eq!(
            text,
            "Failed to forward request: Authentication failed: Invalid credentials"
        );
        assert!(!text.contains("bad token"));
    }

    #[test]
    fn test_local_errors_keep_their_description() {
        let err = ForwardError::UnsupportedMethod("BREW".into()).into_forwarding_failure();
        assert_eq!(
            err.to_string(),
            "Failed to forward request: Unsupported HTTP method: BREW"
        );
    }

    #[test]
    fn test_failed_is_not_wrapped_twice() {
        let err = ForwardError::Failed { message: "boom".into() }.into_forwarding_failure();
        assert_eq!(err.to_string(), "Failed to forward request: boom");
    }
}
