//! Tentative left/right pairings and the generator that proposes them.

use morph_config::AnalysisConfig;
use morph_core::{DataType, Field, FieldPath, Model};

/// Whether a candidate pairs the fields themselves or the elements of two
/// collection fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateScope {
    Field,
    Element,
}

/// A (left path, right path) pairing waiting to be judged by the rule chain.
#[derive(Debug, Clone)]
pub struct IntersectCandidate {
    left: FieldPath,
    right: FieldPath,
    left_field: Field,
    right_field: Field,
    scope: CandidateScope,
}

impl IntersectCandidate {
    /// Returns `None` if either path is the root path.
    #[must_use]
    pub fn new(left: FieldPath, right: FieldPath) -> Option<Self> {
        let left_field = left.final_field()?.clone();
        let right_field = right.final_field()?.clone();
        Some(Self {
            left,
            right,
            left_field,
            right_field,
            scope: CandidateScope::Field,
        })
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
    pub const fn scope(&self) -> CandidateScope {
        self.scope
    }

    #[must_use]
    pub const fn left_field(&self) -> &Field {
        &self.left_field
    }

    #[must_use]
    pub const fn right_field(&self) -> &Field {
        &self.right_field
    }

    /// The type under judgement on the left: the element type for element
    /// candidates, the field type otherwise.
    #[must_use]
    pub fn left_type(&self) -> &DataType {
        self.scoped_type(self.left_field())
    }

    #[must_use]
    pub fn right_type(&self) -> &DataType {
        self.scoped_type(self.right_field())
    }

    /// Model behind [`IntersectCandidate::left_type`], if it is an object type.
    #[must_use]
    pub fn left_model(&self) -> Option<&Model> {
        self.scoped_model(self.left_field())
    }

    #[must_use]
    pub fn right_model(&self) -> Option<&Model> {
        self.scoped_model(self.right_field())
    }

    /// The secondary candidate comparing the element types of two collection
    /// fields.
    #[must_use]
    pub fn element_candidate(&self) -> Option<Self> {
        let both_collections = self.left_field.is_collection() && self.right_field.is_collection();
        (self.scope == CandidateScope::Field && both_collections).then(|| Self {
            scope: CandidateScope::Element,
            ..self.clone()
        })
    }

    fn scoped_type<'a>(&self, field: &'a Field) -> &'a DataType {
        match self.scope {
            CandidateScope::Field => field.data_type(),
            CandidateScope::Element => field.data_type().strip_collection(),
        }
    }

    fn scoped_model<'a>(&self, field: &'a Field) -> Option<&'a Model> {
        if self.scoped_type(field).is_object() {
            field.model()
        } else {
            None
        }
    }
}

/// Enumerates candidate pairings between two models.
///
/// Exact names are paired first, then, with flattening enabled, names that
/// spell a nested path on the other side (`DataProperty` with `Data.Property`,
/// in either direction). Collections only pair with collections.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    max_depth: usize,
    flattening: bool,
}

impl CandidateGenerator {
    #[must_use]
    pub const fn new(max_depth: usize, flattening: bool) -> Self {
        Self {
            max_depth,
            flattening,
        }
    }

    #[must_use]
    pub const fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.max_path_depth, config.flattening)
    }

    /// Candidates between the top-level fields of two models.
    #[must_use]
    pub fn roots(&self, left: &Model, right: &Model) -> Vec<IntersectCandidate> {
        self.match_level(&FieldPath::root(left), &FieldPath::root(right))
    }

    /// Candidates one level below a rejected pairing of two complex fields.
    #[must_use]
    pub fn expand(&self, candidate: &IntersectCandidate) -> Vec<IntersectCandidate> {
        let (left, right) = (candidate.left_field(), candidate.right_field());
        if candidate.scope() != CandidateScope::Field || !left.is_complex() || !right.is_complex() {
            return Vec::new();
        }
        self.match_level(candidate.left(), candidate.right())
    }

    fn match_level(&self, left: &FieldPath, right: &FieldPath) -> Vec<IntersectCandidate> {
        let mut candidates = Vec::new();
        if left.len() >= self.max_depth || right.len() >= self.max_depth {
            return candidates;
        }

        for left_field in left.child_fields() {
            let Some(right_field) = right.terminal_model().and_then(|m| m.field(left_field.name()))
            else {
                continue;
            };
            if left_field.is_collection() == right_field.is_collection() {
                candidates.extend(pair(left, left_field.name(), right, right_field.name()));
            }
        }

        if !self.flattening {
            return candidates;
        }

        // Right side nested, left side flat.
        for left_field in left.child_fields() {
            for (left_path, right_path) in self.spell_pairs(left, left_field, right) {
                candidates.extend(IntersectCandidate::new(left_path, right_path));
            }
        }
        // Left side nested, right side flat.
        for right_field in right.child_fields() {
            for (right_path, left_path) in self.spell_pairs(right, right_field, left) {
                candidates.extend(IntersectCandidate::new(left_path, right_path));
            }
        }
        candidates
    }

    /// Pair the flat `field` under `flat_parent` with every nested path under
    /// `nested_parent` whose concatenated names spell the field name.
    fn spell_pairs(
        &self,
        flat_parent: &FieldPath,
        field: &Field,
        nested_parent: &FieldPath,
    ) -> Vec<(FieldPath, FieldPath)> {
        let Ok(flat) = flat_parent.child(field.name()) else {
            return Vec::new();
        };
        self.spell(nested_parent, field.name(), true)
            .into_iter()
            .filter(|nested| {
                nested.final_field().map(Field::is_collection) == Some(field.is_collection())
            })
            .map(|nested| (flat.clone(), nested))
            .collect()
    }

    /// Paths below `parent` whose field names concatenate to `name`.
    ///
    /// The outermost call only follows proper prefixes, so exact matches are
    /// left to the exact-name pass.
    fn spell(&self, parent: &FieldPath, name: &str, outermost: bool) -> Vec<FieldPath> {
        let mut found = Vec::new();
        for field in parent.child_fields() {
            let Ok(child) = parent.child(field.name()) else {
                continue;
            };
            if field.name() == name {
                if !outermost {
                    found.push(child);
                }
                continue;
            }
            let Some(rest) = name.strip_prefix(field.name()) else {
                continue;
            };
            if !rest.is_empty() && field.nested_model().is_some() && child.len() < self.max_depth {
                found.extend(self.spell(&child, rest, false));
            }
        }
        found
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

fn pair(
    left: &FieldPath,
    left_name: &str,
    right: &FieldPath,
    right_name: &str,
) -> Option<IntersectCandidate> {
    IntersectCandidate::new(left.child(left_name).ok()?, right.child(right_name).ok()?)
}

#[cfg(test)]
mod tests {
    use morph_core::{ContainerKind, Primitive};
    use pretty_assertions::assert_eq;

    use super::*;

    fn rendered(candidates: &[IntersectCandidate]) -> Vec<(String, String)> {
        candidates
            .iter()
            .map(|c| (c.left().to_string(), c.right().to_string()))
            .collect()
    }

    fn nested() -> Model {
        let data = Model::builder("Data")
            .field(Field::new("Property", Primitive::Int32))
            .build()
            .unwrap();
        Model::builder("Nested")
            .field(Field::new("Data", &data))
            .build()
            .unwrap()
    }

    fn flat() -> Model {
        Model::builder("Flat")
            .field(Field::new("DataProperty", Primitive::Int32))
            .build()
            .unwrap()
    }

    #[test]
    fn exact_names_pair_first() {
        let left = Model::builder("L")
            .field(Field::new("A", Primitive::Int32))
            .field(Field::new("B", Primitive::Text))
            .build()
            .unwrap();
        let right = Model::builder("R")
            .field(Field::new("B", Primitive::Text))
            .field(Field::new("C", Primitive::Int32))
            .build()
            .unwrap();
        let candidates = CandidateGenerator::default().roots(&left, &right);
        assert_eq!(rendered(&candidates), [("B".to_string(), "B".to_string())]);
    }

    #[test]
    fn flat_name_inflates_into_nested_path() {
        let candidates = CandidateGenerator::default().roots(&flat(), &nested());
        assert_eq!(
            rendered(&candidates),
            [("DataProperty".to_string(), "Data.Property".to_string())]
        );
    }

    #[test]
    fn nested_path_flattens_into_flat_name() {
        let candidates = CandidateGenerator::default().roots(&nested(), &flat());
        assert_eq!(
            rendered(&candidates),
            [("Data.Property".to_string(), "DataProperty".to_string())]
        );
    }

    #[test]
    fn flattening_can_be_disabled() {
        let candidates = CandidateGenerator::new(4, false).roots(&flat(), &nested());
        assert!(candidates.is_empty());
    }

    #[test]
    fn depth_budget_limits_spelling() {
        let candidates = CandidateGenerator::new(1, true).roots(&flat(), &nested());
        assert!(candidates.is_empty());
    }

    #[test]
    fn collections_only_pair_with_collections() {
        let left = Model::builder("L")
            .field(Field::collection("Tags", ContainerKind::List, Primitive::Text))
            .build()
            .unwrap();
        let right = Model::builder("R")
            .field(Field::new("Tags", Primitive::Text))
            .build()
            .unwrap();
        assert!(CandidateGenerator::default().roots(&left, &right).is_empty());
    }

    #[test]
    fn element_candidate_strips_container() {
        let item = Model::builder("Item").build().unwrap();
        let left = Model::builder("L")
            .field(Field::collection("Items", ContainerKind::Array, &item))
            .build()
            .unwrap();
        let right = Model::builder("R")
            .field(Field::collection("Items", ContainerKind::List, &item))
            .build()
            .unwrap();
        let candidate = CandidateGenerator::default().roots(&left, &right).remove(0);
        assert!(candidate.left_model().is_none());
        let element = candidate.element_candidate().unwrap();
        assert_eq!(element.scope(), CandidateScope::Element);
        assert_eq!(element.left_type(), &DataType::Object(item.id()));
        assert_eq!(element.right_model(), Some(&item));
        assert!(element.element_candidate().is_none());
    }

    #[test]
    fn expand_descends_into_same_named_complex_fields() {
        let other = Model::builder("OtherData")
            .field(Field::new("Property", Primitive::Int32))
            .build()
            .unwrap();
        let right = Model::builder("Right")
            .field(Field::new("Data", &other))
            .build()
            .unwrap();
        let generator = CandidateGenerator::default();
        let root = generator.roots(&nested(), &right).remove(0);
        let expanded = generator.expand(&root);
        assert_eq!(
            rendered(&expanded),
            [("Data.Property".to_string(), "Data.Property".to_string())]
        );
    }
}
