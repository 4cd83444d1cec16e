//! Immutable compiled mappings and their execution.

use std::borrow::Cow;
use std::fmt;
use std::slice;
use std::sync::Arc;

use futures::future::try_join_all;
use morph_core::{Model, Record};

use crate::binding::Binding;
use crate::context::MappingContext;
use crate::error::MappingError;
use crate::graph::{ObjectGraphReader, ObjectGraphReaderWriter};
use crate::loader::ResourceLoader;

/// The ordered bindings from one model to another, plus the loaders they need.
///
/// Cheap to clone and safe to run from many threads at once.
#[derive(Clone)]
pub struct Mapping {
    inner: Arc<MappingInner>,
}

struct MappingInner {
    from: Model,
    to: Model,
    bindings: Vec<Binding>,
    loaders: Vec<Arc<dyn ResourceLoader>>,
    concurrent_loaders: bool,
}

impl Mapping {
    pub(crate) fn new(
        from: Model,
        to: Model,
        bindings: Vec<Binding>,
        loaders: Vec<Arc<dyn ResourceLoader>>,
        concurrent_loaders: bool,
    ) -> Self {
        Self {
            inner: Arc::new(MappingInner {
                from,
                to,
                bindings,
                loaders,
                concurrent_loaders,
            }),
        }
    }

    #[must_use]
    pub fn from_model(&self) -> &Model {
        &self.inner.from
    }

    #[must_use]
    pub fn to_model(&self) -> &Model {
        &self.inner.to
    }

    /// Bindings in destination declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.inner.bindings
    }

    /// Loaders registered while compiling this pair. Nested mappings keep
    /// their own; [`Mapping::prefetch`] runs both.
    #[must_use]
    pub fn resource_loaders(&self) -> &[Arc<dyn ResourceLoader>] {
        &self.inner.loaders
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run every binding once against one instance, synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::ModelMismatch`] if either graph has the wrong
    /// model, or the first error a binding raises.
    pub fn apply(
        &self,
        from: &Record,
        to: &mut Record,
        context: &MappingContext,
    ) -> Result<(), MappingError> {
        check_model(self.from_model(), from)?;
        check_model(self.to_model(), to)?;
        let reader = ObjectGraphReader::new(from);
        let mut writer = ObjectGraphReaderWriter::new(to);
        for binding in self.bindings() {
            binding.run(&reader, &mut writer, context)?;
        }
        Ok(())
    }

    /// Run every resource loader over the batch.
    ///
    /// Loaders of this mapping receive `sources`. Loaders of a nested mapping
    /// receive that mapping and copies of every nested source object the batch
    /// holds for it; they are skipped when the batch holds none.
    ///
    /// # Errors
    ///
    /// Returns the first loader error.
    pub async fn prefetch(
        &self,
        sources: &[Record],
        context: &MappingContext,
    ) -> Result<(), MappingError> {
        let plan = self.load_plan(sources)?;
        let calls: Vec<_> = plan
            .iter()
            .flat_map(|(mapping, sources)| {
                mapping
                    .resource_loaders()
                    .iter()
                    .map(move |loader| (loader, mapping, sources))
            })
            .collect();
        if calls.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            loaders = calls.len(),
            mappings = plan.len(),
            sources = sources.len(),
            concurrent = self.inner.concurrent_loaders,
            "prefetching resources"
        );
        if self.inner.concurrent_loaders {
            try_join_all(
                calls
                    .iter()
                    .map(|(loader, mapping, sources)| loader.load_resources(mapping, sources, context)),
            )
            .await?;
        } else {
            for (loader, mapping, sources) in calls {
                loader.load_resources(mapping, sources, context).await?;
            }
        }
        Ok(())
    }

    /// This mapping with `sources`, then every nested mapping reachable from
    /// the batch with the nested source objects gathered for it.
    fn load_plan<'a>(
        &self,
        sources: &'a [Record],
    ) -> Result<Vec<(Self, Cow<'a, [Record]>)>, MappingError> {
        let mut plan = vec![(self.clone(), Cow::Borrowed(sources))];
        let mut pending = self.nested_sources(sources)?;
        while let Some((mapping, records)) = pending.pop() {
            pending.extend(mapping.nested_sources(&records)?);
            match plan.iter_mut().find(|(planned, _)| planned.ptr_eq(&mapping)) {
                Some((_, planned)) => planned.to_mut().extend(records),
                None => plan.push((mapping, Cow::Owned(records))),
            }
        }
        Ok(plan)
    }

    fn nested_sources(&self, sources: &[Record]) -> Result<Vec<(Self, Vec<Record>)>, MappingError> {
        let mut nested = Vec::new();
        for binding in self.bindings() {
            let Some(handle) = binding.nested_mapping() else {
                continue;
            };
            let mut records = Vec::new();
            for source in sources {
                binding.collect_nested_sources(source, &mut records);
            }
            if !records.is_empty() {
                nested.push((handle.get()?.clone(), records));
            }
        }
        Ok(nested)
    }

    /// Map one source into a new destination graph.
    ///
    /// # Errors
    ///
    /// See [`Mapping::prefetch`] and [`Mapping::apply`].
    pub async fn map(&self, source: &Record) -> Result<Record, MappingError> {
        let mut destination = Record::new(self.to_model());
        self.map_into(source, &mut destination).await?;
        Ok(destination)
    }

    /// Map one source onto an existing destination graph.
    ///
    /// # Errors
    ///
    /// See [`Mapping::prefetch`] and [`Mapping::apply`].
    pub async fn map_into(&self, source: &Record, destination: &mut Record) -> Result<(), MappingError> {
        let context = MappingContext::new();
        self.prefetch(slice::from_ref(source), &context).await?;
        self.apply(source, destination, &context)
    }

    /// Map a batch: one prefetch phase, then one synchronous pass per source
    /// in input order.
    ///
    /// # Errors
    ///
    /// See [`Mapping::prefetch`] and [`Mapping::apply`].
    pub async fn map_batch(&self, sources: &[Record]) -> Result<Vec<Record>, MappingError> {
        let context = MappingContext::new();
        self.prefetch(sources, &context).await?;
        sources
            .iter()
            .map(|source| {
                let mut destination = Record::new(self.to_model());
                self.apply(source, &mut destination, &context)?;
                Ok(destination)
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`MappingError::BatchSize`] if the slices differ in length, and
    /// otherwise see [`Mapping::map_batch`].
    pub async fn map_batch_into(
        &self,
        sources: &[Record],
        destinations: &mut [Record],
    ) -> Result<(), MappingError> {
        if sources.len() != destinations.len() {
            return Err(MappingError::BatchSize {
                sources: sources.len(),
                destinations: destinations.len(),
            });
        }
        let context = MappingContext::new();
        self.prefetch(sources, &context).await?;
        for (source, destination) in sources.iter().zip(destinations.iter_mut()) {
            self.apply(source, destination, &context)?;
        }
        Ok(())
    }
}

fn check_model(expected: &Model, record: &Record) -> Result<(), MappingError> {
    if record.model() == expected {
        Ok(())
    } else {
        Err(MappingError::ModelMismatch {
            expected: expected.name().to_string(),
            found: record.model().name().to_string(),
        })
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("from", &self.from_model().name())
            .field("to", &self.to_model().name())
            .field("bindings", &self.bindings())
            .field("loaders", &self.resource_loaders().len())
            .finish()
    }
}
