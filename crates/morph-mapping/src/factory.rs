//! Turning accepted intersections into bindings.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use morph_analysis::{IntersectedField, IntersectionKind};
use morph_config::MorphConfig;
use morph_core::{FieldPath, Model, ModelId};

use crate::binding::{Binding, BindingAction, ElementAction, NestedMapping};
use crate::builder::MappingBuilder;
use crate::error::MappingError;
use crate::loader::ResourceLoader;

/// Placeholders for every schema pair currently compiling, shared by one
/// top-level build and all the nested builds it triggers.
#[derive(Default)]
pub(crate) struct CompileSession {
    pending: RefCell<HashMap<(ModelId, ModelId), NestedMapping>>,
}

impl CompileSession {
    pub(crate) fn begin(&self, from: &Model, to: &Model) -> NestedMapping {
        let nested = NestedMapping::pending(from, to);
        self.pending
            .borrow_mut()
            .insert((from.id(), to.id()), nested.clone());
        nested
    }

    pub(crate) fn finish(&self, from: &Model, to: &Model) {
        self.pending.borrow_mut().remove(&(from.id(), to.id()));
    }

    fn get(&self, from: &Model, to: &Model) -> Option<NestedMapping> {
        self.pending.borrow().get(&(from.id(), to.id())).cloned()
    }
}

/// State of one mapping compilation, handed to binding factories and
/// conventions.
pub struct MappingFactoryContext<'a> {
    builder: &'a MappingBuilder,
    session: &'a CompileSession,
    bindings: Vec<Binding>,
    loaders: Vec<Arc<dyn ResourceLoader>>,
}

impl<'a> MappingFactoryContext<'a> {
    pub(crate) const fn new(builder: &'a MappingBuilder, session: &'a CompileSession) -> Self {
        Self {
            builder,
            session,
            bindings: Vec::new(),
            loaders: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_model(&self) -> &Model {
        self.builder.from_model()
    }

    #[must_use]
    pub fn to_model(&self) -> &Model {
        self.builder.to_model()
    }

    #[must_use]
    pub fn config(&self) -> &MorphConfig {
        self.builder.config()
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// True if a binding already writes `to`, one of its ancestors, or one of
    /// its descendants.
    ///
    /// A sub-mapping destination only claims the paths its nested mapping
    /// writes: a flattened `DataProperty` may still fill `Data.Property` when
    /// the nested mapping for `Data` has nothing for `Property`.
    #[must_use]
    pub fn is_bound(&self, to: &FieldPath) -> bool {
        let names = to.names();
        self.bindings.iter().any(|binding| binding.writes(&names))
    }

    /// Add a binding unless its destination is already bound.
    pub fn add_binding(&mut self, binding: Binding) -> bool {
        if self.is_bound(binding.to_path()) {
            tracing::trace!(to = %binding.to_path(), "destination already bound");
            return false;
        }
        self.bindings.push(binding);
        true
    }

    /// Register a loader once per mapping, however often it is added.
    pub fn add_resource_loader(&mut self, loader: Arc<dyn ResourceLoader>) {
        let known = self
            .loaders
            .iter()
            .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&loader)));
        if !known {
            self.loaders.push(loader);
        }
    }

    /// The mapping between two nested models: cached, in progress, or
    /// compiled now.
    ///
    /// # Errors
    ///
    /// Returns any error from compiling the nested pair.
    pub fn sub_mapping(&mut self, from: &Model, to: &Model) -> Result<NestedMapping, MappingError> {
        if let Some(mapping) = self.builder.store().try_get(from, to) {
            tracing::debug!(from = %from, to = %to, "using stored mapping");
            return Ok(NestedMapping::resolved(mapping));
        }
        if let Some(pending) = self.session.get(from, to) {
            tracing::debug!(from = %from, to = %to, "reusing in-progress mapping");
            return Ok(pending);
        }
        let mapping = self.builder.for_models(from, to).build_in(self.session)?;
        Ok(NestedMapping::resolved(mapping))
    }

    pub(crate) fn into_parts(self) -> (Vec<Binding>, Vec<Arc<dyn ResourceLoader>>) {
        (self.bindings, self.loaders)
    }
}

/// Creates a binding for intersections of the kinds it understands.
pub trait BindingFactory: Send + Sync {
    /// `Ok(None)` passes the field to the next factory.
    ///
    /// # Errors
    ///
    /// Errors abort the whole compilation.
    fn create_binding(
        &self,
        context: &mut MappingFactoryContext<'_>,
        field: &IntersectedField,
    ) -> Result<Option<Binding>, MappingError>;
}

/// Identity intersections become copies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyBindingFactory;

impl BindingFactory for CopyBindingFactory {
    fn create_binding(
        &self,
        _context: &mut MappingFactoryContext<'_>,
        field: &IntersectedField,
    ) -> Result<Option<Binding>, MappingError> {
        if !matches!(field.kind(), IntersectionKind::Identity) {
            return Ok(None);
        }
        Binding::new(field.left(), field.right(), BindingAction::Copy).map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertBindingFactory;

impl BindingFactory for ConvertBindingFactory {
    fn create_binding(
        &self,
        _context: &mut MappingFactoryContext<'_>,
        field: &IntersectedField,
    ) -> Result<Option<Binding>, MappingError> {
        let IntersectionKind::ExplicitConvert(converter) = field.kind() else {
            return Ok(None);
        };
        Binding::new(
            field.left(),
            field.right(),
            BindingAction::Convert(converter.clone()),
        )
        .map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubMappingBindingFactory;

impl BindingFactory for SubMappingBindingFactory {
    fn create_binding(
        &self,
        context: &mut MappingFactoryContext<'_>,
        field: &IntersectedField,
    ) -> Result<Option<Binding>, MappingError> {
        let IntersectionKind::SubMapping { left, right } = field.kind() else {
            return Ok(None);
        };
        let nested = context.sub_mapping(left, right)?;
        Binding::new(field.left(), field.right(), BindingAction::SubMapping(nested)).map(Some)
    }
}

/// Collection intersections whose elements copy, convert, or sub-map.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionBindingFactory;

impl BindingFactory for CollectionBindingFactory {
    fn create_binding(
        &self,
        context: &mut MappingFactoryContext<'_>,
        field: &IntersectedField,
    ) -> Result<Option<Binding>, MappingError> {
        let IntersectionKind::Collection { element, target } = field.kind() else {
            return Ok(None);
        };
        let element = match element.as_ref() {
            IntersectionKind::Identity => ElementAction::Copy,
            IntersectionKind::ExplicitConvert(converter) => ElementAction::Convert(converter.clone()),
            IntersectionKind::SubMapping { left, right } => {
                ElementAction::SubMapping(context.sub_mapping(left, right)?)
            }
            IntersectionKind::Collection { .. } => return Ok(None),
        };
        let action = BindingAction::Collection {
            element,
            kind: *target,
        };
        Binding::new(field.left(), field.right(), action).map(Some)
    }
}

/// Copy, convert, collection, then sub-mapping.
#[must_use]
pub fn default_factories() -> Vec<Arc<dyn BindingFactory>> {
    vec![
        Arc::new(CopyBindingFactory),
        Arc::new(ConvertBindingFactory),
        Arc::new(CollectionBindingFactory),
        Arc::new(SubMappingBindingFactory),
    ]
}
