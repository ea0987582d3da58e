use thiserror::Error;

/// Top-level error type for Salescast infrastructure concerns.
///
/// Domain failures (API, archive, chat) have their own error types in the
/// crates that produce them; this type covers configuration, I/O and
/// serialization, which every crate shares.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SalescastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Table codec error: {0}")]
    Codec(String),
}

impl From<toml::de::Error> for SalescastError {
    fn from(err: toml::de::Error) -> Self {
        SalescastError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SalescastError {
    fn from(err: toml::ser::Error) -> Self {
        SalescastError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SalescastError {
    fn from(err: serde_json::Error) -> Self {
        SalescastError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SalescastError {
    fn from(err: csv::Error) -> Self {
        SalescastError::Codec(err.to_string())
    }
}

/// A specialized `Result` type for Salescast operations.
pub type Result<T> = std::result::Result<T, SalescastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SalescastError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SalescastError = io_err.into();
        assert!(matches!(err, SalescastError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: SalescastError = toml_err.into();
        assert!(matches!(err, SalescastError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SalescastError = json_err.into();
        assert!(matches!(err, SalescastError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error: "));
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(SalescastError, &str)> = vec![
            (
                SalescastError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                SalescastError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
            (
                SalescastError::Codec("short write".to_string()),
                "Table codec error: short write",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }
}
