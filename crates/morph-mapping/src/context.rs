//! Per-batch resource store.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::MappingError;

type Resource = Arc<dyn Any + Send + Sync>;

/// String-keyed slots filled by resource loaders and read by bindings.
///
/// One context belongs to one batch invocation. Loaders of the same batch may
/// store into it while they run together.
#[derive(Default)]
pub struct MappingContext {
    resources: Mutex<HashMap<String, Resource>>,
}

impl MappingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource, replacing any earlier value under the key.
    pub fn store<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.store_arc(key, Arc::new(value));
    }

    pub fn store_arc(&self, key: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.lock().insert(key.into(), value);
    }

    /// Fetch a resource. An absent key is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ResourceType`] if the key holds another type.
    pub fn retrieve<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>, MappingError> {
        let Some(resource) = self.lock().get(key).cloned() else {
            return Ok(None);
        };
        resource
            .downcast::<T>()
            .map(Some)
            .map_err(|_| MappingError::ResourceType {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Resource>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MappingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.lock().keys().cloned().collect();
        keys.sort();
        f.debug_struct("MappingContext").field("keys", &keys).finish()
    }
}
