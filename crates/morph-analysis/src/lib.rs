//! # morph-analysis
//!
//! Discovers which field paths of two models can exchange values.
//!
//! - [`CandidateGenerator`] proposes pairings: exact names, then flattened or
//!   inflated names (`DataProperty` against `Data.Property`).
//! - [`RuleChain`] judges each pairing with ordered [`IntersectionRule`]s:
//!   identity, explicit conversion, sub-mapping. First acceptance wins.
//! - [`IntersectionAnalyzer`] drives both and returns an [`Intersection`].

pub mod analyzer;
pub mod candidate;
pub mod conversion;
pub mod intersection;
pub mod rules;

pub use analyzer::IntersectionAnalyzer;
pub use candidate::{CandidateGenerator, CandidateScope, IntersectCandidate};
pub use conversion::{ConversionRegistry, Converter};
pub use intersection::{IntersectedField, Intersection, IntersectionKind};
pub use rules::{
    ExplicitConversionRule, IdentityRule, IntersectionRule, RuleChain, SubMappingRule,
};
