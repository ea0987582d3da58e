//! Error types for archive extraction.

/// The archive as a whole could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive cannot be opened: {0}")]
    Open(String),
    #[error("invalid classification rule: {0}")]
    Rule(String),
}

/// One entry could not be decoded. Recorded, never fatal to the extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("entry '{name}' could not be read: {reason}")]
    Read { name: String, reason: String },
    #[error("entry '{name}' is not valid UTF-8 text: {reason}")]
    InvalidText { name: String, reason: String },
    #[error("entry '{name}' failed to decode: {reason}")]
    Decode { name: String, reason: String },
}

impl EntryError {
    /// Name of the archive entry that failed.
    pub fn name(&self) -> &str {
        match self {
            EntryError::Read { name, .. }
            | EntryError::InvalidText { name, .. }
            | EntryError::Decode { name, .. } => name,
        }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Open(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_error_display() {
        let err = ArchiveError::Open("invalid Zip archive".to_string());
        assert_eq!(err.to_string(), "archive cannot be opened: invalid Zip archive");

        let err = ArchiveError::Rule("unclosed group".to_string());
        assert_eq!(err.to_string(), "invalid classification rule: unclosed group");
    }

    #[test]
    fn test_entry_error_display_and_name() {
        let err = EntryError::InvalidText {
            name: "forecast_summary_report.txt".to_string(),
            reason: "invalid utf-8 sequence".to_string(),
        };
        assert_eq!(err.name(), "forecast_summary_report.txt");
        assert!(err.to_string().contains("not valid UTF-8"));

        let err = EntryError::Decode {
            name: "chart.png".to_string(),
            reason: "truncated".to_string(),
        };
        assert_eq!(err.name(), "chart.png");
        assert_eq!(err.to_string(), "entry 'chart.png' failed to decode: truncated");
    }
}
