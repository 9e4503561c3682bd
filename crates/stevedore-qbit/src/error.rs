//! Error types for download-client operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Primary error type for download-client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failed before a response arrived.
    #[error("request to {endpoint} failed")]
    Transport {
        /// API endpoint identifier.
        endpoint: &'static str,
        /// Source transport error.
        source: reqwest::Error,
    },
    /// The client answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// API endpoint identifier.
        endpoint: &'static str,
        /// Status code returned by the client.
        status: StatusCode,
    },
    /// Login was refused with the client's rejection body.
    #[error("authentication rejected for user '{username}'")]
    AuthRejected {
        /// Username presented at login.
        username: String,
    },
    /// Response body could not be decoded into the expected shape.
    #[error("failed to decode response from {endpoint}")]
    Decode {
        /// API endpoint identifier.
        endpoint: &'static str,
        /// Source decode error.
        source: reqwest::Error,
    },
    /// Request payload could not be encoded.
    #[error("failed to encode request for {endpoint}")]
    Encode {
        /// API endpoint identifier.
        endpoint: &'static str,
        /// Source encode error.
        source: serde_json::Error,
    },
    /// Base URL was invalid or an endpoint could not be joined onto it.
    #[error("invalid client base URL '{value}'")]
    BaseUrl {
        /// Offending URL value.
        value: String,
        /// Source parse error.
        source: url::ParseError,
    },
}

impl ClientError {
    pub(crate) const fn transport(endpoint: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { endpoint, source }
    }

    pub(crate) const fn status(endpoint: &'static str, status: StatusCode) -> Self {
        Self::Status { endpoint, status }
    }

    pub(crate) const fn decode(endpoint: &'static str, source: reqwest::Error) -> Self {
        Self::Decode { endpoint, source }
    }
}

/// Convenience alias for download-client results.
pub type ClientResult<T> = Result<T, ClientError>;
