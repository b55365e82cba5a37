use thiserror::Error;

/// Top-level error type for the rovassist system.
///
/// Configuration and lexicon loading fail through this type. Subsystem crates
/// define their own error types and implement `From<RovError>` so that `?`
/// works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RovError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lexicon error: {0}")]
    Lexicon(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for RovError {
    fn from(err: toml::de::Error) -> Self {
        RovError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RovError {
    fn from(err: toml::ser::Error) -> Self {
        RovError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RovError {
    fn from(err: serde_json::Error) -> Self {
        RovError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for rovassist operations.
pub type Result<T> = std::result::Result<T, RovError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RovError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = RovError::Lexicon("bad condition".to_string());
        assert_eq!(err.to_string(), "Lexicon error: bad condition");

        let err = RovError::Serialization("invalid json".to_string());
        assert_eq!(err.to_string(), "Serialization error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RovError = io_err.into();
        assert!(matches!(err, RovError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let rov_err: RovError = err.unwrap_err().into();
        assert!(matches!(rov_err, RovError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let rov_err: RovError = err.unwrap_err().into();
        assert!(matches!(rov_err, RovError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
