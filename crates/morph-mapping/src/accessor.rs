//! Resolved slot indices for field paths, cached for the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use morph_core::{CoreError, FieldPath, Model};

/// One step of a resolved path.
#[derive(Debug, Clone)]
pub(crate) struct Segment {
    pub(crate) slot: usize,
    /// Model to instantiate when the container at this step is missing.
    pub(crate) model: Option<Model>,
    pub(crate) can_write: bool,
}

/// Slot-index form of a [`FieldPath`]: walking a graph through an accessor
/// involves no name lookups.
#[derive(Debug)]
pub struct FieldAccessor {
    path: FieldPath,
    segments: Box<[Segment]>,
}

impl FieldAccessor {
    fn resolve(path: &FieldPath) -> Result<Self, CoreError> {
        let mut model = path.model();
        let mut segments = Vec::with_capacity(path.len());
        for field in path.fields() {
            let slot = model
                .field_index(field.name())
                .ok_or_else(|| CoreError::UnknownField {
                    model: model.name().to_string(),
                    field: field.name().to_string(),
                })?;
            segments.push(Segment {
                slot,
                model: field.nested_model().cloned(),
                can_write: field.can_write(),
            });
            if let Some(nested) = field.nested_model() {
                model = nested;
            }
        }
        Ok(Self {
            path: path.clone(),
            segments: segments.into_boxed_slice(),
        })
    }

    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

static ACCESSORS: LazyLock<RwLock<HashMap<FieldPath, Arc<FieldAccessor>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// The shared accessor for `path`, resolving it on first use.
///
/// # Errors
///
/// Returns [`CoreError::UnknownField`] if a segment is not declared on its
/// model.
pub fn accessor_for(path: &FieldPath) -> Result<Arc<FieldAccessor>, CoreError> {
    if let Some(accessor) = ACCESSORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(path)
    {
        return Ok(Arc::clone(accessor));
    }
    let resolved = Arc::new(FieldAccessor::resolve(path)?);
    let mut accessors = ACCESSORS.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(accessors.entry(path.clone()).or_insert(resolved)))
}
