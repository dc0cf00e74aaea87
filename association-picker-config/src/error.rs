//! Error types for the picker configuration system

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Configuration file format not supported
    #[error("Unsupported configuration file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    Parse { source: Box<figment::Error> },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{key}': {message}")]
    Validation { key: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::Parse {
            source: Box::new(error),
        }
    }
}

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::validation("page_size", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration validation failed for 'page_size': must be at least 1"
        );
    }

    #[test]
    fn test_from_figment_error() {
        let err: ConfigError = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
