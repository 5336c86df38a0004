//! Caller-safe messages for downstream failures.

use axum::http::StatusCode;

use crate::forward::client::DownstreamFailure;

/// Fixed message for downstream authentication failures.
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed: Invalid credentials";

/// Map a downstream failure to the message shown to the caller.
///
/// A 401 body is replaced wholesale; other statuses carry the code and the
/// raw body; transport failures carry the failure description.
pub fn classify(failure: &DownstreamFailure) -> String {
    match failure {
        DownstreamFailure::Http { status, .. } if *status == StatusCode::UNAUTHORIZED => {
            AUTH_FAILED_MESSAGE.to_string()
        }
        DownstreamFailure::Http { status, raw_body } => {
            format!("Downstream returned {}: {}", status.as_u16(), raw_body)
        }
        DownstreamFailure::Transport { cause } => {
            format!("Downstream unreachable: {cause}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_body_never_leaks() {
        let failure = DownstreamFailure::Http {
            status: StatusCode::UNAUTHORIZED,
            raw_body: r#"{"error":"bad token"}"#.into(),
        };
        assert_eq!(classify(&failure), "Authentication failed: Invalid credentials");
    }

    #[test]
    fn test_status_and_body_included() {
        let failure = DownstreamFailure::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            raw_body: "boom".into(),
        };
        let message = classify(&failure);
        assert!(message.contains("500"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_forbidden_is_not_sanitized() {
        let failure = DownstreamFailure::Http {
            status: StatusCode::FORBIDDEN,
            raw_body: "scope missing".into(),
        };
        assert_eq!(classify(&failure), "Downstream returned 403: scope missing");
    }

    #[test]
    fn test_transport_failure_description() {
        let failure = DownstreamFailure::Transport {
            cause: "connection failed: connection refused".into(),
        };
        assert_eq!(
            classify(&failure),
            "Downstream unreachable: connection failed: connection refused"
        );
    }
}
