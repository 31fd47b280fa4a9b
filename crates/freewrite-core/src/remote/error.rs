//! Failure taxonomy for journal service requests.

use thiserror::Error;

/// Errors raised by a single journal service request
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport or connectivity failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response could not be read as an HTTP response body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered with a non-2xx status
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// The request body could not be encoded
    #[error("Encoding failed: {0}")]
    EncodingFailed(serde_json::Error),

    /// The response body could not be decoded
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Whether the service reported the requested record as missing.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Server { status: 404, .. })
    }
}
