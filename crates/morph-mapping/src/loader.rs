//! Batch-scoped asynchronous prefetch.

use async_trait::async_trait;
use morph_core::Record;

use crate::context::MappingContext;
use crate::error::MappingError;
use crate::mapping::Mapping;

/// Fetches resources for a whole batch before any binding runs.
///
/// A loader sees every source of the batch at once and is expected to fetch
/// each distinct key once, however many sources share it. Results go into the
/// [`MappingContext`] for bindings to read.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// # Errors
    ///
    /// Any error aborts the batch before bindings run.
    async fn load_resources(
        &self,
        mapping: &Mapping,
        sources: &[Record],
        context: &MappingContext,
    ) -> Result<(), MappingError>;
}
