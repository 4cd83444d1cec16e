//! The ordered rule chain that judges candidates.
//!
//! Rules never fail: a rule that cannot pair two types answers `None` so the
//! analyzer can try element candidates or deeper expansions.

use std::sync::Arc;

use crate::candidate::IntersectCandidate;
use crate::conversion::ConversionRegistry;
use crate::intersection::{IntersectedField, IntersectionKind};

pub trait IntersectionRule: Send + Sync {
    /// Stable name recorded on every field this rule accepts.
    fn name(&self) -> &'static str;

    fn is_valid_intersection(&self, candidate: &IntersectCandidate) -> Option<IntersectedField>;
}

fn accept(
    rule: &dyn IntersectionRule,
    candidate: &IntersectCandidate,
    kind: IntersectionKind,
) -> IntersectedField {
    IntersectedField::new(
        candidate.left().clone(),
        candidate.right().clone(),
        kind,
        rule.name(),
    )
}

/// Accepts candidates whose types are identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRule;

impl IntersectionRule for IdentityRule {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn is_valid_intersection(&self, candidate: &IntersectCandidate) -> Option<IntersectedField> {
        (candidate.left_type() == candidate.right_type())
            .then(|| accept(self, candidate, IntersectionKind::Identity))
    }
}

/// Accepts candidates with a registered conversion between their
/// collection-stripped types, provided both sides agree on being collections.
#[derive(Debug, Clone, Default)]
pub struct ExplicitConversionRule {
    registry: ConversionRegistry,
}

impl ExplicitConversionRule {
    #[must_use]
    pub const fn new(registry: ConversionRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }
}

impl IntersectionRule for ExplicitConversionRule {
    fn name(&self) -> &'static str {
        "explicit_conversion"
    }

    fn is_valid_intersection(&self, candidate: &IntersectCandidate) -> Option<IntersectedField> {
        let (left, right) = (candidate.left_type(), candidate.right_type());
        if left == right || left.is_collection() != right.is_collection() {
            return None;
        }
        let converter = self
            .registry
            .get(left.strip_collection(), right.strip_collection())?
            .clone();
        let kind = match right.container_kind() {
            Some(target) => IntersectionKind::Collection {
                element: Box::new(IntersectionKind::ExplicitConvert(converter)),
                target,
            },
            None => IntersectionKind::ExplicitConvert(converter),
        };
        Some(accept(self, candidate, kind))
    }
}

/// Accepts two object types with their own (different) models.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubMappingRule;

impl IntersectionRule for SubMappingRule {
    fn name(&self) -> &'static str {
        "sub_mapping"
    }

    fn is_valid_intersection(&self, candidate: &IntersectCandidate) -> Option<IntersectedField> {
        let left = candidate.left_model()?;
        let right = candidate.right_model()?;
        (left != right).then(|| {
            accept(
                self,
                candidate,
                IntersectionKind::SubMapping {
                    left: left.clone(),
                    right: right.clone(),
                },
            )
        })
    }
}

/// Rules in priority order; the first acceptance wins.
#[derive(Clone)]
pub struct RuleChain {
    rules: Vec<Arc<dyn IntersectionRule>>,
}

impl RuleChain {
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Identity, then explicit conversion through `registry`, then sub-mapping.
    #[must_use]
    pub fn with_registry(registry: ConversionRegistry) -> Self {
        Self::empty()
            .with_rule(IdentityRule)
            .with_rule(ExplicitConversionRule::new(registry))
            .with_rule(SubMappingRule)
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl IntersectionRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Insert a rule ahead of every rule already in the chain.
    #[must_use]
    pub fn with_rule_first(mut self, rule: impl IntersectionRule + 'static) -> Self {
        self.rules.insert(0, Arc::new(rule));
        self
    }

    #[must_use]
    pub fn evaluate(&self, candidate: &IntersectCandidate) -> Option<IntersectedField> {
        self.rules.iter().find_map(|rule| {
            let accepted = rule.is_valid_intersection(candidate);
            if accepted.is_some() {
                tracing::trace!(
                    rule = rule.name(),
                    left = %candidate.left(),
                    right = %candidate.right(),
                    "candidate accepted"
                );
            }
            accepted
        })
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}

impl Default for RuleChain {
    /// The built-in chain with numeric casts.
    fn default() -> Self {
        Self::with_registry(ConversionRegistry::with_numeric_casts())
    }
}

impl std::fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleChain")
            .field("rules", &self.rule_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use morph_core::{ContainerKind, DataType, Field, Model, Primitive, Value};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::candidate::CandidateGenerator;
    use crate::conversion::Converter;

    fn candidate(left: Field, right: Field) -> IntersectCandidate {
        let l = Model::builder("L").field(left).build().unwrap();
        let r = Model::builder("R").field(right).build().unwrap();
        CandidateGenerator::default().roots(&l, &r).remove(0)
    }

    #[test]
    fn identity_wins_for_same_types() {
        let c = candidate(
            Field::new("A", Primitive::Int32),
            Field::new("A", Primitive::Int32),
        );
        let accepted = RuleChain::default().evaluate(&c).unwrap();
        assert_eq!(accepted.rule(), "identity");
        assert!(matches!(accepted.kind(), IntersectionKind::Identity));
    }

    #[test]
    fn explicit_conversion_for_numeric_cast() {
        let c = candidate(
            Field::new("A", Primitive::Int32),
            Field::new("A", Primitive::Int64),
        );
        let accepted = RuleChain::default().evaluate(&c).unwrap();
        assert_eq!(accepted.rule(), "explicit_conversion");
        let IntersectionKind::ExplicitConvert(converter) = accepted.kind() else {
            panic!("expected a conversion, got {:?}", accepted.kind());
        };
        assert_eq!(converter.convert(&Value::Int32(2)), Some(Value::Int64(2)));
    }

    #[test]
    fn explicit_conversion_applies_to_collections() {
        let c = candidate(
            Field::collection("A", ContainerKind::Array, Primitive::Int32),
            Field::collection("A", ContainerKind::List, Primitive::Float64),
        );
        let accepted = RuleChain::default().evaluate(&c).unwrap();
        assert_eq!(accepted.rule(), "explicit_conversion");
        assert!(matches!(
            accepted.kind(),
            IntersectionKind::Collection { target: ContainerKind::List, element }
                if matches!(**element, IntersectionKind::ExplicitConvert(_))
        ));
    }

    #[test]
    fn no_rule_matches_unrelated_primitives() {
        let c = candidate(
            Field::new("A", Primitive::Bool),
            Field::new("A", Primitive::Text),
        );
        assert!(RuleChain::default().evaluate(&c).is_none());
    }

    #[test]
    fn explicit_conversion_beats_sub_mapping() {
        let a = Model::builder("A")
            .field(Field::new("x", Primitive::Int32))
            .build()
            .unwrap();
        let b = Model::builder("B")
            .field(Field::new("x", Primitive::Int32))
            .build()
            .unwrap();
        let mut registry = ConversionRegistry::new();
        registry.register_converter(
            DataType::Object(a.id()),
            DataType::Object(b.id()),
            Converter::new(|_| None),
        );
        let c = candidate(Field::new("F", &a), Field::new("F", &b));

        let with_cast = RuleChain::with_registry(registry).evaluate(&c).unwrap();
        assert_eq!(with_cast.rule(), "explicit_conversion");

        let without = RuleChain::default().evaluate(&c).unwrap();
        assert_eq!(without.rule(), "sub_mapping");
        assert!(matches!(
            without.kind(),
            IntersectionKind::SubMapping { left, right } if left == &a && right == &b
        ));
    }

    #[test]
    fn rule_order_is_configurable() {
        struct Never;
        impl IntersectionRule for Never {
            fn name(&self) -> &'static str {
                "never"
            }
            fn is_valid_intersection(&self, _: &IntersectCandidate) -> Option<IntersectedField> {
                None
            }
        }
        let chain = RuleChain::default().with_rule_first(Never);
        assert_eq!(
            chain.rule_names(),
            ["never", "identity", "explicit_conversion", "sub_mapping"]
        );
    }
}
