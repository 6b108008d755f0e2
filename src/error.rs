//! Error types for marketpulse operations.
//!
//! This module provides the error hierarchy using `thiserror` for chat
//! streaming, upstream provider calls, and CLI commands.

use thiserror::Error;

/// Result type alias for marketpulse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Chat stream errors (request, body, mid-stream read).
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Upstream provider errors.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Errors raised while opening or reading a chat response stream.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The chat endpoint answered with a non-success status.
    #[error("chat request failed with status {status}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
    },

    /// The byte stream failed mid-read.
    #[error("stream read failed: {0}")]
    Read(String),
}

/// Errors raised by upstream data providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required input was absent or blank.
    #[error("missing required parameter: {name}")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Upstream payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Upstream answered successfully but carried no data.
    #[error("no data available for {what}")]
    NoData {
        /// What was requested.
        what: String,
    },
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown gateway endpoint.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

impl ProviderError {
    /// Builds a [`ProviderError::MissingParameter`].
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }
}

// Implement From traits for standard library and third-party errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Command(CommandError::ExecutionFailed(err.to_string()))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
            };
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Http(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.into())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Provider(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_display() {
        let err = StreamError::RequestFailed { status: 502 };
        assert_eq!(err.to_string(), "chat request failed with status 502");

        let err = StreamError::Read("connection reset".to_string());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::missing("ticker");
        assert_eq!(err.to_string(), "missing required parameter: ticker");

        let err = ProviderError::Status { status: 404 };
        assert_eq!(err.to_string(), "upstream returned status 404");

        let err = ProviderError::NoData {
            what: "quote ZZZZ".to_string(),
        };
        assert_eq!(err.to_string(), "no data available for quote ZZZZ");
    }

    #[test]
    fn test_command_error_display() {
        let err = CommandError::UnknownEndpoint("bogus".to_string());
        assert_eq!(err.to_string(), "unknown endpoint: bogus");
    }

    #[test]
    fn test_error_from_stream() {
        let err: Error = StreamError::RequestFailed { status: 500 }.into();
        assert!(matches!(err, Error::Stream(_)));
    }

    #[test]
    fn test_error_from_provider() {
        let err: Error = ProviderError::Http("timeout".to_string()).into();
        assert!(matches!(err, Error::Provider(_)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Command(CommandError::ExecutionFailed(_))));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err: serde_json::Error = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Provider(ProviderError::Decode(_))));
    }

    #[test]
    fn test_error_config() {
        let err = Error::Config {
            message: "bad config".to_string(),
        };
        assert_eq!(err.to_string(), "configuration error: bad config");
    }
}
