//! # morph-mapping
//!
//! Compiles and runs mappings between two models.
//!
//! A [`MappingBuilder`] runs intersection analysis for a schema pair, turns the
//! accepted pairings into [`Binding`]s through [`BindingFactory`]s, lets
//! [`Convention`]s add their own bindings and [`ResourceLoader`]s, and returns
//! an immutable [`Mapping`]. Nested schema pairs are compiled on demand and
//! cached in a [`MappingStore`]; self-referential pairs resolve through an
//! in-progress placeholder.
//!
//! Running a mapping over a batch has two phases: every resource loader is
//! awaited once for the whole batch, then every binding runs synchronously per
//! instance, reading prefetched resources from the [`MappingContext`].
//!
//! ```
//! use morph_core::{Field, Model, Primitive, Record};
//! use morph_mapping::MappingBuilder;
//!
//! let source = Model::builder("Flat")
//!     .field(Field::new("DataProperty", Primitive::Int32))
//!     .build()?;
//! let data = Model::builder("Data")
//!     .field(Field::new("Property", Primitive::Int32))
//!     .build()?;
//! let target = Model::builder("Nested")
//!     .field(Field::new("Data", &data))
//!     .build()?;
//!
//! let mapping = MappingBuilder::new(&source, &target).build()?;
//! assert_eq!(mapping.bindings()[0].to_path().names(), ["Data", "Property"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod accessor;
pub mod binding;
mod builder;
mod context;
pub mod convention;
mod error;
pub mod factory;
pub mod graph;
mod loader;
mod mapping;
mod store;

pub use accessor::{FieldAccessor, accessor_for};
pub use binding::{Binding, BindingAction, BindingTransform, ElementAction, NestedMapping};
pub use builder::MappingBuilder;
pub use context::MappingContext;
pub use convention::Convention;
pub use error::MappingError;
pub use factory::{
    BindingFactory, CollectionBindingFactory, ConvertBindingFactory, CopyBindingFactory,
    MappingFactoryContext, SubMappingBindingFactory, default_factories,
};
pub use graph::{CollectionStream, GraphRead, GraphWrite, ObjectGraphReader, ObjectGraphReaderWriter};
pub use loader::ResourceLoader;
pub use mapping::Mapping;
pub use store::MappingStore;
