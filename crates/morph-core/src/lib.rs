//! # morph-core
//!
//! Core types shared by every Morph crate.
//!
//! This crate provides:
//! - `Model` / `Field`: immutable schema descriptions, including self-referential ones
//! - `DataType`: the semantic type of a field (primitive, object, opaque, collection)
//! - `FieldPath`: a validated root-to-leaf address inside a model
//! - `Value` / `Record`: dynamic object graphs that compiled mappings run against
//! - `CoreError`: errors raised while describing schemas or building graphs
//!
//! Field metadata is expected to come from an outer layer (a derive, a schema file,
//! reflection over another system). Nothing here inspects concrete Rust types.

pub mod data_type;
pub mod error;
pub mod field;
pub mod model;
pub mod path;
pub mod record;
pub mod value;

pub use data_type::{ContainerKind, DataType, Primitive};
pub use error::CoreError;
pub use field::{Field, TypeRef};
pub use model::{Model, ModelBuilder, ModelId};
pub use path::FieldPath;
pub use record::Record;
pub use value::{FromValue, Opaque, Value};
