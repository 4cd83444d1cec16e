//! Semantic data types carried by model fields.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::ModelId;

/// Scalar types the engine understands natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
}

impl Primitive {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::Text => "text",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::Float32 | Self::Float64
        )
    }
}

/// Storage shape of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Fixed-length sequence, allocated once when the whole sequence is known.
    Array,
    /// Growable sequence.
    List,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array => f.write_str("array"),
            Self::List => f.write_str("list"),
        }
    }
}

/// The semantic type of a field.
///
/// Two data types are identical when they describe the same shape: object types
/// compare by model identity, opaque types by name, collections by container kind
/// and element type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Primitive(Primitive),
    /// A complex type described by its own model.
    Object(ModelId),
    /// A reference type with no model; values are copied by identity.
    Opaque(Arc<str>),
    Collection {
        kind: ContainerKind,
        element: Box<DataType>,
    },
}

impl DataType {
    #[must_use]
    pub fn collection(kind: ContainerKind, element: Self) -> Self {
        Self::Collection {
            kind,
            element: Box::new(element),
        }
    }

    #[must_use]
    pub fn opaque(name: impl Into<Arc<str>>) -> Self {
        Self::Opaque(name.into())
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    #[must_use]
    pub fn element_type(&self) -> Option<&Self> {
        match self {
            Self::Collection { element, .. } => Some(element),
            _ => None,
        }
    }

    #[must_use]
    pub const fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Self::Collection { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The element type of a collection, or the type itself.
    #[must_use]
    pub fn strip_collection(&self) -> &Self {
        self.element_type().unwrap_or(self)
    }
}

impl From<Primitive> for DataType {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.as_str()),
            Self::Object(id) => write!(f, "object{id}"),
            Self::Opaque(name) => write!(f, "opaque<{name}>"),
            Self::Collection { kind, element } => write!(f, "{kind}<{element}>"),
        }
    }
}
