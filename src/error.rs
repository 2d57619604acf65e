//! Error types for the Cloud SQL databases data source.
//!
//! Configuration problems are fatal and never retried. API errors carry the
//! HTTP status so callers can tell a missing instance (404) from a transient
//! "operation in progress" (409) condition.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for data source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the data source.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A filter block names a field that cannot be filtered on.
    #[error("Invalid filter: unknown field '{0}', expected one of name, charset, collation")]
    UnknownFilterField(String),

    /// A filter pattern failed to compile.
    #[error("Invalid regex {pattern}: {message}")]
    InvalidRegex {
        /// The offending pattern, verbatim
        pattern: String,
        /// Compiler diagnostic
        message: String,
    },

    /// Neither the read request nor the provider configuration names a project.
    #[error("project: required field is not set")]
    MissingProject,

    /// Provider configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ========================================================================
    // API Errors
    // ========================================================================
    /// The remote service reported that the collection does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Another Cloud SQL operation is running against the instance.
    #[error("Operation in progress: {0}")]
    OperationInProgress(String),

    /// Any other non-success API response.
    #[error("API request failed: {status} - {message}")]
    Api {
        /// HTTP status returned by the API
        status: StatusCode,
        /// Error message extracted from the response body
        message: String,
    },

    /// Retries exhausted the read timeout.
    #[error("Timeout after {timeout_secs} seconds: {last_error}")]
    Timeout {
        /// Configured timeout in seconds
        timeout_secs: u64,
        /// The last transient error observed
        last_error: String,
    },

    /// Credentials could not produce an access token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The request never produced a response.
    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is a configuration error that fails the read outright
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownFilterField(_)
                | Error::InvalidRegex { .. }
                | Error::MissingProject
                | Error::Config(_)
        )
    }

    /// Whether the error means the parent instance or collection is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether the caller should retry the request
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::OperationInProgress(_) => true,
            Error::Api { status, .. } => matches!(
                *status,
                StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::INTERNAL_SERVER_ERROR
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_not_retryable() {
        let err = Error::InvalidRegex {
            pattern: "[".to_string(),
            message: "unclosed character class".to_string(),
        };
        assert!(err.is_configuration());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Invalid regex ["));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(Error::OperationInProgress("busy".to_string()).is_retryable());
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = Error::Api {
                status,
                message: String::new(),
            };
            assert!(err.is_retryable(), "{} should be retryable", status);
        }

        let forbidden = Error::Api {
            status: StatusCode::FORBIDDEN,
            message: "Permission denied".to_string(),
        };
        assert!(!forbidden.is_retryable());
    }

    #[test]
    fn test_not_found() {
        let err = Error::NotFound("Databases in \"main\" instance".to_string());
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Databases in \"main\" instance not found");
    }
}
