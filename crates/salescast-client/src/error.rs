//! Error type for calls to the forecast service.

/// A failed call to the forecast service, normalized to one shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The service answered with a non-success status. `detail` is the
    /// server-provided `detail` field, or the status text when the body
    /// carried none.
    #[error("API Error: {detail}")]
    Status { status: u16, detail: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of a non-success response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The human-readable part of the error, without the variant prefix.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Status { detail, .. } => detail,
            ApiError::Transport(msg) | ApiError::Decode(msg) | ApiError::InvalidUrl(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
