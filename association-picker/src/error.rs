//! Error types for the picker engine

use association_picker_config::ConfigError;
use association_picker_fields::FieldsError;
use association_picker_js::JsError;
use thiserror::Error;

/// Errors raised while assembling or driving a picker.
///
/// The public selection and query operations never return these; they are
/// produced by collaborators and constructors and degrade to empty or fallback
/// state at the boundary.
#[derive(Error, Debug)]
pub enum PickerError {
    /// The remote list collaborator failed
    #[error("list fetch for '{collection}' failed: {message}")]
    Fetch { collection: String, message: String },

    /// A `@name` template refers to a renderer that is not registered
    #[error("no renderer registered as '{0}'")]
    UnknownRenderer(String),

    /// A named renderer could not render the record
    #[error("renderer '{0}' declined the record")]
    RendererDeclined(String),

    /// Per-field selector settings could not be read
    #[error("invalid selector settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Fields(#[from] FieldsError),

    #[error(transparent)]
    Js(#[from] JsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PickerError {
    pub fn fetch(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            collection: collection.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PickerError>;
