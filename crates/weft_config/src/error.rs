//! Errors raised while loading `weft.toml`.

/// Failure to load or validate a project file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML could not be parsed into the expected shape.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A value is out of range or malformed.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.name".to_string());
        assert_eq!(err.to_string(), "missing required field: project.name");
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("compile.max_states must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "validation error: compile.max_states must be at least 1"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: ConfigError = io.into();
        assert!(err.to_string().starts_with("failed to read configuration:"));
    }
}
