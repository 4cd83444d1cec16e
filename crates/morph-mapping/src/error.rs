//! Errors raised while compiling and running mappings.
//!
//! Data conditions (absent containers, failed conversions, unbound fields) are
//! not errors; bindings skip them. What remains are programming errors.

use morph_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A resource exists under the key but holds another type.
    #[error("Resource '{key}' is not a {expected}")]
    ResourceType { key: String, expected: &'static str },

    /// A graph value exists at the path but holds another type.
    #[error("Value at '{path}' is not a {expected}")]
    ValueType { path: String, expected: &'static str },

    /// A graph of the wrong model was handed to a mapping.
    #[error("Mapping expects a '{expected}' graph, got '{found}'")]
    ModelMismatch { expected: String, found: String },

    /// `map_batch_into` was given slices of different lengths.
    #[error("Batch size mismatch: {sources} sources, {destinations} destinations")]
    BatchSize { sources: usize, destinations: usize },

    /// A nested mapping placeholder was never filled.
    #[error("Nested mapping '{from}' -> '{to}' is not compiled")]
    Unresolved { from: String, to: String },

    /// Failure reported by a resource loader or a custom binding.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
