//! Error type shared by every API client operation.

use std::fmt;

use thiserror::Error;

/// Result alias used by the API client.
pub type ApiResult<T> = Result<T, ApiError>;

/// Machine-readable classification of an [`ApiError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request could not be built from the endpoint description.
    InvalidRequest,
    /// Connection, DNS, or body transfer failure.
    Transport,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-2xx status.
    Http,
    /// The response body did not match the expected structure.
    Decode,
    /// A server-push stream could not be established.
    Stream,
}

impl ErrorCode {
    /// Returns the wire-stable string form of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Transport => "transport_error",
            Self::Timeout => "timeout",
            Self::Http => "http_error",
            Self::Decode => "decode_error",
            Self::Stream => "stream_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error for transport, protocol, and decode failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    status: Option<u16>,
}

impl ApiError {
    /// Creates an error with the supplied code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    /// Convenience constructor for timeouts.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Convenience constructor for non-success HTTP statuses.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Http, message).with_status(status)
    }

    /// Convenience constructor for decode failures.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decode, message)
    }

    /// Convenience constructor for stream establishment failures.
    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Stream, message)
    }

    /// Attaches the HTTP status that caused the failure.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, when the failure came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let err = ApiError::stream("server returned 500").with_status(500);
        assert_eq!(err.to_string(), "stream_error: server returned 500");
        assert_eq!(err.code().as_str(), "stream_error");
        assert_eq!(err.status(), Some(500));
    }
}
