//! Accepted pairings.

use morph_core::{ContainerKind, FieldPath, Model};

use crate::conversion::Converter;

/// How values move from the left path to the right path.
#[derive(Debug, Clone)]
pub enum IntersectionKind {
    /// Identical types; values are copied as they are.
    Identity,
    /// Values go through an explicit conversion.
    ExplicitConvert(Converter),
    /// Both sides are objects of different models; a nested mapping is needed.
    SubMapping { left: Model, right: Model },
    /// Element-wise transfer into a fresh container of kind `target`.
    Collection {
        element: Box<IntersectionKind>,
        target: ContainerKind,
    },
}

impl IntersectionKind {
    /// The innermost kind, looking through collections.
    #[must_use]
    pub fn element_kind(&self) -> &Self {
        match self {
            Self::Collection { element, .. } => element.element_kind(),
            other => other,
        }
    }
}

/// A candidate accepted by a rule, with the strategy that rule chose.
#[derive(Debug, Clone)]
pub struct IntersectedField {
    left: FieldPath,
    right: FieldPath,
    kind: IntersectionKind,
    rule: &'static str,
}

impl IntersectedField {
    #[must_use]
    pub const fn new(
        left: FieldPath,
        right: FieldPath,
        kind: IntersectionKind,
        rule: &'static str,
    ) -> Self {
        Self {
            left,
            right,
            kind,
            rule,
        }
    }

    #[must_use]
    pub const fn left(&self) -> &FieldPath {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &FieldPath {
        &self.right
    }

    #[must_use]
    pub const fn kind(&self) -> &IntersectionKind {
        &self.kind
    }

    /// Name of the rule that accepted the pairing.
    #[must_use]
    pub const fn rule(&self) -> &'static str {
        self.rule
    }

    /// Wrap an element-level acceptance into a collection-level one.
    #[must_use]
    pub fn into_collection(self, target: ContainerKind) -> Self {
        Self {
            kind: IntersectionKind::Collection {
                element: Box::new(self.kind),
                target,
            },
            ..self
        }
    }
}

/// Every accepted pairing between two models, in discovery order.
#[derive(Debug, Clone)]
pub struct Intersection {
    left_model: Model,
    right_model: Model,
    fields: Vec<IntersectedField>,
}

impl Intersection {
    #[must_use]
    pub const fn new(left_model: Model, right_model: Model, fields: Vec<IntersectedField>) -> Self {
        Self {
            left_model,
            right_model,
            fields,
        }
    }

    #[must_use]
    pub const fn left_model(&self) -> &Model {
        &self.left_model
    }

    #[must_use]
    pub const fn right_model(&self) -> &Model {
        &self.right_model
    }

    #[must_use]
    pub fn fields(&self) -> &[IntersectedField] {
        &self.fields
    }

    #[must_use]
    pub fn into_fields(self) -> Vec<IntersectedField> {
        self.fields
    }
}
