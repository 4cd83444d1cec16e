//! Root-to-leaf addresses inside a model.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::CoreError;
use crate::field::Field;
use crate::model::Model;

/// A model root plus an ordered list of fields, each declared on the nested
/// model of the one before it.
///
/// Equality is structural: same root model and same field names.
#[derive(Clone)]
pub struct FieldPath {
    root: Model,
    fields: Vec<Field>,
}

impl FieldPath {
    /// The empty path, addressing the root graph itself.
    #[must_use]
    pub fn root(model: &Model) -> Self {
        Self {
            root: model.clone(),
            fields: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] or [`CoreError::InvalidPath`] if a
    /// segment cannot be resolved.
    pub fn from_names(model: &Model, names: &[&str]) -> Result<Self, CoreError> {
        names
            .iter()
            .try_fold(Self::root(model), |path, name| path.child(name))
    }

    /// Extend the path by one field of its terminal model.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPath`] if the final field has no nested model
    /// (primitives, opaque types, collections), or [`CoreError::UnknownField`] if
    /// the nested model has no such field.
    pub fn child(&self, name: &str) -> Result<Self, CoreError> {
        let model = self.terminal_model().ok_or_else(|| CoreError::InvalidPath {
            path: self.to_string(),
            reason: "final field has no nested model".to_string(),
        })?;
        let field = model.field(name).ok_or_else(|| CoreError::UnknownField {
            model: model.name().to_string(),
            field: name.to_string(),
        })?;
        let mut fields = self.fields.clone();
        fields.push(field.clone());
        Ok(Self {
            root: self.root.clone(),
            fields,
        })
    }

    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.root
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn final_field(&self) -> Option<&Field> {
        self.fields.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.fields.is_empty()
    }

    /// The model children of this path are declared on.
    #[must_use]
    pub fn terminal_model(&self) -> Option<&Model> {
        match self.fields.last() {
            None => Some(&self.root),
            Some(field) => field.nested_model(),
        }
    }

    /// Fields that can extend this path; empty when the path ends at a leaf.
    #[must_use]
    pub fn child_fields(&self) -> &[Field] {
        self.terminal_model().map(Model::fields).unwrap_or(&[])
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parents) = self.fields.split_last()?;
        Some(Self {
            root: self.root.clone(),
            fields: parents.to_vec(),
        })
    }

    /// String projection, e.g. `["Data", "Property"]`.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(Field::name).collect()
    }

    /// True if `prefix` is this path or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.root == prefix.root
            && prefix.fields.len() <= self.fields.len()
            && self
                .fields
                .iter()
                .zip(&prefix.fields)
                .all(|(a, b)| a.name() == b.name())
    }

    /// Index of every segment within its declaring model.
    ///
    /// Sorting paths by this key orders them depth-first in declaration order.
    #[must_use]
    pub fn declaration_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.fields.len());
        let mut model = Some(&self.root);
        for field in &self.fields {
            let index = model
                .and_then(|m| m.field_index(field.name()))
                .unwrap_or(usize::MAX);
            order.push(index);
            model = field.nested_model();
        }
        order
    }
}

impl PartialEq for FieldPath {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name() == b.name())
    }
}

impl Eq for FieldPath {}

impl Hash for FieldPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        for field in &self.fields {
            field.name().hash(state);
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{}", self.root);
        }
        f.write_str(&self.names().join("."))
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPath({}:{})", self.root.name(), self.names().join("."))
    }
}
