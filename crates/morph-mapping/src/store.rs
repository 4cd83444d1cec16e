//! Compiled mappings keyed by schema pair.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use morph_core::{Model, ModelId};

use crate::mapping::Mapping;

/// Cache of compiled mappings.
///
/// Lookup never compiles. Two concurrent compilations of the same pair may
/// both finish; the one added last is kept.
#[derive(Debug, Default)]
pub struct MappingStore {
    mappings: RwLock<HashMap<(ModelId, ModelId), Mapping>>,
}

impl MappingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn try_get(&self, from: &Model, to: &Model) -> Option<Mapping> {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(from.id(), to.id()))
            .cloned()
    }

    pub fn add(&self, mapping: Mapping) {
        let key = (mapping.from_model().id(), mapping.to_model().id());
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, mapping);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
