//! Error types for report generation.

use salescast_archive::ArchiveError;
use salescast_client::ApiError;

/// Prefix of every banner raised by a failed generation.
pub const GENERATION_FAILED: &str = "Failed to generate forecast.";

/// Errors from report generation and catalog lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Missing or inconsistent input; raised before any network call.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// A newer generation started before this one finished.
    #[error("generation #{0} was superseded by a newer generation")]
    Superseded(u64),
}

impl ReportError {
    /// Text for the session banner, or `None` for errors the user should
    /// not see.
    pub fn banner_message(&self) -> Option<String> {
        match self {
            ReportError::Validation(message) => Some(message.clone()),
            ReportError::Api(_) | ReportError::Archive(_) => {
                Some(format!("{} {}", GENERATION_FAILED, self))
            }
            ReportError::Superseded(_) => None,
        }
    }
}
