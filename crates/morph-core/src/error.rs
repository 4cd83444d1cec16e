//! Errors raised while describing schemas and building object graphs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A field name was not found on the model.
    #[error("Unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },

    /// Two fields of one model share a name.
    #[error("Duplicate field '{field}' on model '{model}'")]
    DuplicateField { model: String, field: String },

    /// `Model::define` was called on a model that already has fields.
    #[error("Model '{0}' is already defined")]
    AlreadyDefined(String),

    /// A path segment does not descend into a nested model.
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A JSON document does not fit the model it is read into.
    #[error("JSON conversion error: {0}")]
    Json(String),
}
