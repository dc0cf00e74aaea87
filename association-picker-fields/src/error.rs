//! Error types for the collection metadata registry

use std::path::PathBuf;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in collection registry operations
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Collection not found by name
    #[error("collection not found: {name}")]
    CollectionNotFound { name: String },

    /// Collection definition is unusable
    #[error("invalid collection '{name}': {message}")]
    InvalidCollection { name: String, message: String },

    /// Registry directory not found
    #[error("collections directory not found: {path}")]
    NotInitialized { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::CollectionNotFound {
            name: "users".into(),
        };
        assert_eq!(err.to_string(), "collection not found: users");
    }

    #[test]
    fn test_invalid_collection_error() {
        let err = FieldsError::InvalidCollection {
            name: "users".into(),
            message: "name cannot be empty".into(),
        };
        assert!(err.to_string().contains("users"));
        assert!(err.to_string().contains("name cannot be empty"));
    }
}
