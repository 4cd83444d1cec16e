//! Compiled copy/convert steps.

use std::fmt;
use std::sync::{Arc, OnceLock};

use morph_analysis::Converter;
use morph_core::{ContainerKind, FieldPath, Model, Record, Value};

use crate::accessor::{FieldAccessor, accessor_for};
use crate::context::MappingContext;
use crate::error::MappingError;
use crate::graph::{GraphRead, GraphWrite, ObjectGraphReader};
use crate::mapping::Mapping;

/// Custom per-value logic for bindings added by conventions, typically reading
/// resources a loader prefetched into the [`MappingContext`].
pub trait BindingTransform: Send + Sync {
    /// `Ok(None)` leaves the destination untouched.
    ///
    /// # Errors
    ///
    /// Any error aborts the mapping run.
    fn transform(
        &self,
        source: &Value,
        context: &MappingContext,
    ) -> Result<Option<Value>, MappingError>;
}

impl<F> BindingTransform for F
where
    F: Fn(&Value, &MappingContext) -> Result<Option<Value>, MappingError> + Send + Sync,
{
    fn transform(
        &self,
        source: &Value,
        context: &MappingContext,
    ) -> Result<Option<Value>, MappingError> {
        self(source, context)
    }
}

/// Handle to the mapping between two nested models.
///
/// While the pair is still compiling (self-referential schemas) the handle is
/// a placeholder; it is filled once compilation of the pair completes.
#[derive(Clone)]
pub struct NestedMapping {
    from: Model,
    to: Model,
    cell: Arc<OnceLock<Mapping>>,
}

impl NestedMapping {
    pub(crate) fn pending(from: &Model, to: &Model) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            cell: Arc::new(OnceLock::new()),
        }
    }

    pub(crate) fn resolved(mapping: Mapping) -> Self {
        let nested = Self::pending(mapping.from_model(), mapping.to_model());
        nested.resolve(mapping);
        nested
    }

    pub(crate) fn resolve(&self, mapping: Mapping) {
        // Only the compilation that registered the placeholder fills it.
        let _ = self.cell.set(mapping);
    }

    #[must_use]
    pub const fn from_model(&self) -> &Model {
        &self.from
    }

    #[must_use]
    pub const fn to_model(&self) -> &Model {
        &self.to
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// # Errors
    ///
    /// Returns [`MappingError::Unresolved`] if compilation never completed.
    pub fn get(&self) -> Result<&Mapping, MappingError> {
        self.cell.get().ok_or_else(|| MappingError::Unresolved {
            from: self.from.name().to_string(),
            to: self.to.name().to_string(),
        })
    }

    /// True if the nested mapping writes `names` (relative to its destination
    /// root), an ancestor or a descendant of it. A pending mapping covers
    /// everything.
    fn writes(&self, names: &[&str]) -> bool {
        self.cell
            .get()
            .is_none_or(|mapping| mapping.bindings().iter().any(|binding| binding.writes(names)))
    }

    /// Map one nested object into a fresh destination object. Null maps to null.
    fn map_value(
        &self,
        value: &Value,
        context: &MappingContext,
        path: &FieldPath,
    ) -> Result<Value, MappingError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Object(source) => {
                let mut destination = Record::new(&self.to);
                self.get()?.apply(source, &mut destination, context)?;
                Ok(Value::Object(destination))
            }
            _ => Err(MappingError::ValueType {
                path: path.to_string(),
                expected: "object",
            }),
        }
    }
}

impl fmt::Debug for NestedMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedMapping")
            .field("from", &self.from.name())
            .field("to", &self.to.name())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// What a collection binding does with each element.
#[derive(Debug, Clone)]
pub enum ElementAction {
    Copy,
    Convert(Converter),
    SubMapping(NestedMapping),
}

impl ElementAction {
    fn apply(
        &self,
        item: &Value,
        context: &MappingContext,
        path: &FieldPath,
    ) -> Result<Option<Value>, MappingError> {
        match self {
            Self::Copy => Ok(Some(item.clone())),
            Self::Convert(converter) => Ok(converter.convert(item)),
            Self::SubMapping(nested) => nested.map_value(item, context, path).map(Some),
        }
    }
}

#[derive(Clone)]
pub enum BindingAction {
    /// Identical types; the value is cloned. Opaque values keep their identity.
    Copy,
    /// A failed conversion leaves the destination untouched.
    Convert(Converter),
    /// Element-wise transfer into a fresh container, committed only if every
    /// element succeeds.
    Collection {
        element: ElementAction,
        kind: ContainerKind,
    },
    SubMapping(NestedMapping),
    Transform(Arc<dyn BindingTransform>),
}

impl BindingAction {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Convert(_) => "convert",
            Self::Collection { .. } => "collection",
            Self::SubMapping(_) => "sub_mapping",
            Self::Transform(_) => "transform",
        }
    }
}

impl fmt::Debug for BindingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection { element, kind } => f
                .debug_struct("Collection")
                .field("element", element)
                .field("kind", kind)
                .finish(),
            Self::SubMapping(nested) => f.debug_tuple("SubMapping").field(nested).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// One step of a compiled mapping: read `from`, write `to`.
#[derive(Clone)]
pub struct Binding {
    from: Arc<FieldAccessor>,
    to: Arc<FieldAccessor>,
    action: BindingAction,
}

impl Binding {
    /// # Errors
    ///
    /// Returns [`MappingError::Core`] if a path cannot be resolved.
    pub fn new(from: &FieldPath, to: &FieldPath, action: BindingAction) -> Result<Self, MappingError> {
        Ok(Self {
            from: accessor_for(from)?,
            to: accessor_for(to)?,
            action,
        })
    }

    #[must_use]
    pub fn from_path(&self) -> &FieldPath {
        self.from.path()
    }

    #[must_use]
    pub fn to_path(&self) -> &FieldPath {
        self.to.path()
    }

    #[must_use]
    pub const fn action(&self) -> &BindingAction {
        &self.action
    }

    /// Run against one source/destination pair.
    ///
    /// Skips silently when a source container is absent, a destination
    /// container cannot be created, or a conversion fails.
    ///
    /// # Errors
    ///
    /// Fails only on programming errors: type confusion in nested graphs or
    /// resources, or an error from a custom transform.
    pub fn run<R: GraphRead, W: GraphWrite>(
        &self,
        from: &R,
        to: &mut W,
        context: &MappingContext,
    ) -> Result<(), MappingError> {
        let Some(source) = from.read_value(&self.from) else {
            tracing::trace!(from = %self.from_path(), "source container absent, binding skipped");
            return Ok(());
        };

        let value = match &self.action {
            BindingAction::Copy => Some(source.clone()),
            BindingAction::Convert(converter) => converter.convert(source),
            BindingAction::SubMapping(nested) => {
                if self.map_onto_existing(nested, source, to, context)? {
                    return Ok(());
                }
                Some(nested.map_value(source, context, self.from_path())?)
            }
            BindingAction::Transform(transform) => transform.transform(source, context)?,
            BindingAction::Collection { element, kind } => {
                return self.run_collection(source, element, *kind, to, context);
            }
        };

        match value {
            Some(value) => self.write(to, value),
            None => {
                tracing::trace!(to = %self.to_path(), "conversion failed, destination untouched");
            }
        }
        Ok(())
    }

    /// Apply a sub-mapping onto the destination object already in place, so
    /// fields the nested mapping does not bind keep their values. Returns
    /// false if there is no object of the nested destination model there.
    fn map_onto_existing<W: GraphWrite>(
        &self,
        nested: &NestedMapping,
        source: &Value,
        to: &mut W,
        context: &MappingContext,
    ) -> Result<bool, MappingError> {
        let Value::Object(source) = source else {
            return Ok(false);
        };
        let existing = to
            .value_mut(&self.to)
            .and_then(Value::as_record_mut)
            .filter(|existing| existing.model() == nested.to_model());
        match existing {
            Some(existing) => {
                nested.get()?.apply(source, existing, context)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn run_collection<W: GraphWrite>(
        &self,
        source: &Value,
        element: &ElementAction,
        kind: ContainerKind,
        to: &mut W,
        context: &MappingContext,
    ) -> Result<(), MappingError> {
        let Some(items) = source.elements() else {
            if source.is_null() {
                self.write(to, Value::Null);
            }
            return Ok(());
        };
        if !to.create_container(&self.to) {
            return Ok(());
        }

        let mut stream = to.stream(&self.to, kind);
        for item in items {
            match element.apply(item, context, self.from.path())? {
                Some(value) => stream.push(value),
                None => {
                    tracing::trace!(
                        to = %self.to.path(),
                        "element conversion failed, collection left untouched"
                    );
                    return Ok(());
                }
            }
        }
        stream.commit();
        Ok(())
    }

    /// True if running this binding writes the destination path `names`, one
    /// of its ancestors or one of its descendants.
    ///
    /// Below a sub-mapping destination only the paths the nested mapping
    /// itself writes count, so other bindings may fill the rest.
    pub(crate) fn writes(&self, names: &[&str]) -> bool {
        let bound = self.to_path().names();
        if names.len() > bound.len() && names.starts_with(&bound) {
            return match &self.action {
                BindingAction::SubMapping(nested) => nested.writes(&names[bound.len()..]),
                _ => true,
            };
        }
        bound.starts_with(names)
    }

    /// The nested mapping run by a sub-mapping or collection-of-models binding.
    pub(crate) const fn nested_mapping(&self) -> Option<&NestedMapping> {
        match &self.action {
            BindingAction::SubMapping(nested)
            | BindingAction::Collection {
                element: ElementAction::SubMapping(nested),
                ..
            } => Some(nested),
            _ => None,
        }
    }

    /// Copy the source objects this binding hands to its nested mapping out of
    /// `source` into `into`.
    pub(crate) fn collect_nested_sources(&self, source: &Record, into: &mut Vec<Record>) {
        let reader = ObjectGraphReader::new(source);
        let Some(value) = reader.read_value(&self.from) else {
            return;
        };
        match value.elements() {
            Some(items) => into.extend(items.iter().filter_map(Value::as_record).cloned()),
            None => into.extend(value.as_record().cloned()),
        }
    }

    fn write<W: GraphWrite>(&self, to: &mut W, value: Value) {
        if to.create_container(&self.to) {
            to.write_value(&self.to, value);
        } else {
            tracing::trace!(to = %self.to_path(), "destination container unavailable");
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("from", &self.from_path().names())
            .field("to", &self.to_path().names())
            .field("action", &self.action)
            .finish()
    }
}
