use thiserror::Error;

/// Top-level error type for the Ovation system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for OvationError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OvationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for OvationError {
    fn from(err: toml::de::Error) -> Self {
        OvationError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OvationError {
    fn from(err: toml::ser::Error) -> Self {
        OvationError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OvationError {
    fn from(err: serde_json::Error) -> Self {
        OvationError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Ovation operations.
pub type Result<T> = std::result::Result<T, OvationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OvationError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OvationError = io_err.into();
        assert!(matches!(err, OvationError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: OvationError = parsed.unwrap_err().into();
        assert!(matches!(err, OvationError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: OvationError = parsed.unwrap_err().into();
        assert!(matches!(err, OvationError::Serialization(_)));
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(OvationError, &str)> = vec![
            (
                OvationError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                OvationError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                OvationError::Feed("feed gone".to_string()),
                "Feed error: feed gone",
            ),
            (
                OvationError::Engine("already running".to_string()),
                "Engine error: already running",
            ),
            (
                OvationError::Api("unauthorized".to_string()),
                "API error: unauthorized",
            ),
            (
                OvationError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_debug_impl() {
        let err = OvationError::Storage("test debug".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Storage"));
        assert!(debug_str.contains("test debug"));
    }
}
