//! Error types for the render-template sandbox

use thiserror::Error;

/// Result type alias for sandbox operations
pub type Result<T> = std::result::Result<T, JsError>;

/// Errors that can occur while compiling or invoking a render template
#[derive(Debug, Error)]
pub enum JsError {
    /// Template source did not compile to a function
    #[error("JavaScript compilation error: {message}")]
    Compilation { message: String },

    /// Template threw or failed while running
    #[error("JavaScript evaluation error: {message}")]
    Evaluation { message: String },

    /// Type conversion error between Rust and JS
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Runtime initialization or configuration error
    #[error("Runtime error: {message}")]
    Runtime { message: String },

    /// Template exceeded its execution deadline
    #[error("Timeout: template exceeded maximum execution time")]
    Timeout,

    /// The worker thread is gone
    #[error("JS worker thread has stopped")]
    WorkerStopped,
}

impl JsError {
    /// Create a compilation error
    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::Compilation {
            message: msg.into(),
        }
    }

    /// Create an evaluation error
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation {
            message: msg.into(),
        }
    }

    /// Create a type conversion error
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: msg.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_detail() {
        assert_eq!(
            JsError::compilation("unexpected token").to_string(),
            "JavaScript compilation error: unexpected token"
        );
        assert!(JsError::Timeout.to_string().contains("maximum execution time"));
    }
}
