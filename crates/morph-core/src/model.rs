//! Immutable schema descriptions.
//!
//! A [`Model`] is a cheap, shareable handle. Identity is assigned at creation and
//! never reused, so two models with the same name and fields are still distinct
//! schemas. Self-referential schemas are built in two steps:
//!
//! ```
//! use morph_core::{Field, Model, Primitive};
//!
//! let node = Model::declare("Node");
//! node.define([
//!     Field::new("value", Primitive::Int32),
//!     Field::new("next", &node),
//! ])
//! .expect("fields are unique");
//! assert_eq!(node.fields().len(), 2);
//! ```
//!
//! Models are interned for the lifetime of the process by whoever caches them, so
//! the reference cycle a self-referential model forms is never reclaimed.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::CoreError;
use crate::field::Field;

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Metadata = Arc<dyn Any + Send + Sync>;

/// One schema: an ordered set of uniquely named fields.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    id: ModelId,
    name: String,
    fields: OnceLock<Box<[Field]>>,
    metadata: Vec<Metadata>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            fields: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Create a model whose fields are supplied later with [`Model::define`].
    pub fn declare(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), Vec::new())
    }

    fn from_parts(name: String, metadata: Vec<Metadata>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                id: ModelId::next(),
                name,
                fields: OnceLock::new(),
                metadata,
            }),
        }
    }

    /// Supply the fields of a declared model.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateField`] if two fields share a name, or
    /// [`CoreError::AlreadyDefined`] if the model already has fields.
    pub fn define(&self, fields: impl IntoIterator<Item = Field>) -> Result<(), CoreError> {
        let fields = unique_fields(&self.inner.name, fields.into_iter().collect())?;
        self.inner
            .fields
            .set(fields)
            .map_err(|_| CoreError::AlreadyDefined(self.inner.name.clone()))
    }

    #[must_use]
    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Fields in declaration order. Empty until the model is defined.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        self.inner.fields.get().map(|fields| &**fields).unwrap_or(&[])
    }

    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.inner.fields.get().is_some()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name() == name)
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name() == name)
    }

    /// Resolve a string path such as `["Data", "Property"]`.
    ///
    /// Every segment but the last must be a non-collection complex field.
    #[must_use]
    pub fn get_field(&self, path: &[&str]) -> Option<&Field> {
        let (last, parents) = path.split_last()?;
        let mut model = self;
        for segment in parents {
            model = model.field(segment)?.nested_model()?;
        }
        model.field(last)
    }

    /// Metadata entries of type `T`, in the order they were attached.
    pub fn metadata<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.inner
            .metadata
            .iter()
            .filter_map(|entry| entry.as_ref().downcast_ref::<T>())
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Model {}

impl Hash for Model {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field names only: a nested model may point back at this one.
        f.debug_struct("Model")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field(
                "fields",
                &self.fields().iter().map(Field::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}

/// One-step construction of a model.
pub struct ModelBuilder {
    name: String,
    fields: Vec<Field>,
    metadata: Vec<Metadata>,
}

impl ModelBuilder {
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn metadata<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.metadata.push(Arc::new(value));
        self
    }

    /// Create the model with its metadata but without fields, for schemas that
    /// refer to themselves. Fields added to the builder are discarded.
    #[must_use]
    pub fn declare(self) -> Model {
        Model::from_parts(self.name, self.metadata)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateField`] if two fields share a name.
    pub fn build(self) -> Result<Model, CoreError> {
        let fields = unique_fields(&self.name, self.fields)?;
        let model = Model::from_parts(self.name, self.metadata);
        // A fresh OnceLock cannot already be set.
        let _ = model.inner.fields.set(fields);
        Ok(model)
    }
}

fn unique_fields(model: &str, fields: Vec<Field>) -> Result<Box<[Field]>, CoreError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
        if !seen.insert(field.name()) {
            return Err(CoreError::DuplicateField {
                model: model.to_string(),
                field: field.name().to_string(),
            });
        }
    }
    Ok(fields.into_boxed_slice())
}
