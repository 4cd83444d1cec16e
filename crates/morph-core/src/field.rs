//! Model members.

use std::fmt;
use std::sync::Arc;

use crate::data_type::{ContainerKind, DataType, Primitive};
use crate::model::Model;

/// What a field holds: a primitive, an opaque reference type, or another model.
#[derive(Clone)]
pub enum TypeRef {
    Primitive(Primitive),
    Opaque(Arc<str>),
    Model(Model),
}

impl TypeRef {
    pub fn opaque(name: impl Into<Arc<str>>) -> Self {
        Self::Opaque(name.into())
    }

    fn into_parts(self) -> (DataType, Option<Model>) {
        match self {
            Self::Primitive(p) => (DataType::Primitive(p), None),
            Self::Opaque(name) => (DataType::Opaque(name), None),
            Self::Model(model) => (DataType::Object(model.id()), Some(model)),
        }
    }
}

impl From<Primitive> for TypeRef {
    fn from(primitive: Primitive) -> Self {
        Self::Primitive(primitive)
    }
}

impl From<&Model> for TypeRef {
    fn from(model: &Model) -> Self {
        Self::Model(model.clone())
    }
}

impl From<Model> for TypeRef {
    fn from(model: Model) -> Self {
        Self::Model(model)
    }
}

/// One named member of a model.
///
/// For complex fields `model()` is the nested model; for collections of complex
/// elements it is the element model.
#[derive(Clone)]
pub struct Field {
    name: Arc<str>,
    data_type: DataType,
    model: Option<Model>,
    can_read: bool,
    can_write: bool,
}

impl Field {
    pub fn new(name: impl Into<Arc<str>>, ty: impl Into<TypeRef>) -> Self {
        let (data_type, model) = ty.into().into_parts();
        Self {
            name: name.into(),
            data_type,
            model,
            can_read: true,
            can_write: true,
        }
    }

    pub fn collection(
        name: impl Into<Arc<str>>,
        kind: ContainerKind,
        element: impl Into<TypeRef>,
    ) -> Self {
        let (element, model) = element.into().into_parts();
        Self {
            name: name.into(),
            data_type: DataType::collection(kind, element),
            model,
            can_read: true,
            can_write: true,
        }
    }

    pub fn opaque(name: impl Into<Arc<str>>, type_name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeRef::opaque(type_name))
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.can_write = false;
        self
    }

    #[must_use]
    pub const fn write_only(mut self) -> Self {
        self.can_read = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    #[must_use]
    pub const fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// The nested model a path may descend into; `None` for collections.
    #[must_use]
    pub fn nested_model(&self) -> Option<&Model> {
        if self.data_type.is_collection() {
            None
        } else {
            self.model.as_ref()
        }
    }

    #[must_use]
    pub fn element_type(&self) -> Option<&DataType> {
        self.data_type.element_type()
    }

    #[must_use]
    pub const fn container_kind(&self) -> Option<ContainerKind> {
        self.data_type.container_kind()
    }

    #[must_use]
    pub const fn can_read(&self) -> bool {
        self.can_read
    }

    #[must_use]
    pub const fn can_write(&self) -> bool {
        self.can_write
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.data_type.is_collection()
    }

    /// A non-collection field with its own model.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        self.data_type.is_object() && self.model.is_some()
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.can_read == other.can_read
            && self.can_write == other.can_write
    }
}

impl Eq for Field {}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("can_read", &self.can_read)
            .field("can_write", &self.can_write)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_of_models_exposes_element_model() {
        let item = Model::builder("Item").build().unwrap();
        let field = Field::collection("Items", ContainerKind::Array, &item);
        assert!(field.is_collection());
        assert!(!field.is_complex());
        assert_eq!(field.model(), Some(&item));
        assert!(field.nested_model().is_none());
        assert_eq!(field.element_type(), Some(&DataType::Object(item.id())));
    }

    #[test]
    fn capability_flags() {
        let field = Field::new("Id", Primitive::Int64).read_only();
        assert!(field.can_read());
        assert!(!field.can_write());
        let field = Field::opaque("Secret", "Token").write_only();
        assert!(!field.can_read());
        assert!(field.can_write());
        assert_eq!(field.data_type(), &DataType::opaque("Token"));
    }
}
