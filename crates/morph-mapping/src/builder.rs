//! Compiling a mapping for one schema pair.

use std::sync::Arc;

use morph_analysis::{ConversionRegistry, IntersectedField, IntersectionAnalyzer, RuleChain};
use morph_config::MorphConfig;
use morph_core::{Field, FieldPath, Model};

use crate::convention::Convention;
use crate::error::MappingError;
use crate::factory::{BindingFactory, CompileSession, MappingFactoryContext, default_factories};
use crate::mapping::Mapping;
use crate::store::MappingStore;

/// Configures and runs one mapping compilation.
///
/// Nested pairs discovered along the way are compiled with the same
/// configuration, rules, factories, conventions and store.
#[derive(Clone)]
pub struct MappingBuilder {
    from: Model,
    to: Model,
    config: MorphConfig,
    rules: RuleChain,
    factories: Vec<Arc<dyn BindingFactory>>,
    conventions: Vec<Arc<dyn Convention>>,
    store: Arc<MappingStore>,
}

impl MappingBuilder {
    /// A builder with default configuration, the built-in rule chain and
    /// factories, no conventions and a private store.
    #[must_use]
    pub fn new(from: &Model, to: &Model) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            config: MorphConfig::default(),
            rules: RuleChain::default(),
            factories: default_factories(),
            conventions: Vec::new(),
            store: Arc::new(MappingStore::new()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MorphConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: RuleChain) -> Self {
        self.rules = rules;
        self
    }

    /// Use the built-in rule chain with a custom conversion registry.
    #[must_use]
    pub fn with_conversions(self, registry: ConversionRegistry) -> Self {
        self.with_rules(RuleChain::with_registry(registry))
    }

    /// Append a factory after the built-in ones.
    #[must_use]
    pub fn with_factory(mut self, factory: impl BindingFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn with_convention(mut self, convention: impl Convention + 'static) -> Self {
        self.conventions.push(Arc::new(convention));
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<MappingStore>) -> Self {
        self.store = store;
        self
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
    pub const fn config(&self) -> &MorphConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<MappingStore> {
        &self.store
    }

    /// Compile the mapping and add it, and every nested mapping it needed, to
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a convention or factory.
    pub fn build(&self) -> Result<Mapping, MappingError> {
        self.build_in(&CompileSession::default())
    }

    /// A builder for the opposite direction, sharing configuration, rules,
    /// factories, conventions and store.
    ///
    /// The two directions compile to independent mappings. A field only
    /// travels in the directions its read/write flags allow, so a read-only
    /// field on one side is mapped one way only.
    #[must_use]
    pub fn reversed(&self) -> Self {
        self.for_models(&self.to, &self.from)
    }

    pub(crate) fn for_models(&self, from: &Model, to: &Model) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            ..self.clone()
        }
    }

    pub(crate) fn build_in(&self, session: &CompileSession) -> Result<Mapping, MappingError> {
        tracing::debug!(from = %self.from, to = %self.to, "compiling mapping");
        let placeholder = session.begin(&self.from, &self.to);
        let result = self.compile(session);
        session.finish(&self.from, &self.to);
        let mapping = result?;

        placeholder.resolve(mapping.clone());
        self.store.add(mapping.clone());
        tracing::debug!(
            from = %self.from,
            to = %self.to,
            bindings = mapping.bindings().len(),
            loaders = mapping.resource_loaders().len(),
            "mapping compiled"
        );
        Ok(mapping)
    }

    fn compile(&self, session: &CompileSession) -> Result<Mapping, MappingError> {
        let mut context = MappingFactoryContext::new(self, session);

        let root = FieldPath::root(&self.from);
        for field in self.from.fields() {
            let source = root.child(field.name())?;
            for convention in &self.conventions {
                convention.make_model_field(&mut context, &source)?;
            }
        }

        let analyzer = IntersectionAnalyzer::from_config(&self.config.analysis, self.rules.clone());
        let intersection = analyzer.analyze(&self.from, &self.to);
        for field in intersection.fields() {
            if !is_transferable(field) {
                tracing::trace!(from = %field.left(), to = %field.right(), "not readable or writable");
                continue;
            }
            if context.is_bound(field.right()) {
                continue;
            }
            for factory in &self.factories {
                if let Some(binding) = factory.create_binding(&mut context, field)? {
                    context.add_binding(binding);
                    break;
                }
            }
        }

        for convention in &self.conventions {
            convention.finalize_model(&mut context)?;
        }

        let (mut bindings, loaders) = context.into_parts();
        bindings.sort_by_cached_key(|binding| binding.to_path().declaration_order());
        Ok(Mapping::new(
            self.from.clone(),
            self.to.clone(),
            bindings,
            loaders,
            self.config.execution.concurrent_loaders,
        ))
    }
}

fn is_transferable(field: &IntersectedField) -> bool {
    field.left().fields().iter().all(Field::can_read)
        && field.right().final_field().is_some_and(Field::can_write)
}

impl std::fmt::Debug for MappingBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingBuilder")
            .field("from", &self.from.name())
            .field("to", &self.to.name())
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("factories", &self.factories.len())
            .field("conventions", &self.conventions.len())
            .finish_non_exhaustive()
    }
}
