//! Dynamic values stored in object graphs.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::data_type::ContainerKind;
use crate::record::Record;

/// One slot of an object graph.
///
/// Nested objects and collections are owned (copying them copies the data);
/// [`Opaque`] values are shared references and copy by identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Object(Record),
    Array(Box<[Value]>),
    List(Vec<Value>),
    Opaque(Opaque),
}

impl Value {
    /// Build a collection value of the requested container kind.
    #[must_use]
    pub fn collection(kind: ContainerKind, items: Vec<Self>) -> Self {
        match kind {
            ContainerKind::Array => Self::Array(items.into_boxed_slice()),
            ContainerKind::List => Self::List(items),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int32(_) => "i32",
            Self::Int64(_) => "i64",
            Self::Float32(_) => "f32",
            Self::Float64(_) => "f64",
            Self::Text(_) => "text",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::List(_) => "list",
            Self::Opaque(_) => "opaque",
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Elements of an array or list.
    #[must_use]
    pub fn elements(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Typed view of this value; `None` on a type mismatch or null.
    #[must_use]
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::Int32(v) => Json::from(*v),
            Self::Int64(v) => Json::from(*v),
            Self::Float32(v) => serde_json::Number::from_f64(f64::from(*v))
                .map_or(Json::Null, Json::Number),
            Self::Float64(v) => {
                serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number)
            }
            Self::Text(v) => Json::String(v.clone()),
            Self::Object(record) => record.to_json(),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::List(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Opaque(opaque) => opaque
                .downcast_ref::<serde_json::Value>()
                .cloned()
                .unwrap_or(Json::Null),
        }
    }
}

/// A shared reference to a value the engine does not model.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    #[must_use]
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().downcast_ref::<T>()
    }

    /// True if both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    /// Name used in type-mismatch errors.
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! value_type {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl FromValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(Clone::clone(inner)),
                    _ => None,
                }
            }
        }
    };
}

value_type!(bool, Bool, "bool");
value_type!(i32, Int32, "i32");
value_type!(i64, Int64, "i64");
value_type!(f32, Float32, "f32");
value_type!(f64, Float64, "f64");
value_type!(String, Text, "text");
value_type!(Record, Object, "object");
value_type!(Opaque, Opaque, "opaque");

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
