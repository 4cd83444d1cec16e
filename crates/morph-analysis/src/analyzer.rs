//! Breadth-first search for accepted pairings between two models.

use std::collections::{HashSet, VecDeque};

use morph_config::AnalysisConfig;
use morph_core::{FieldPath, Model};

use crate::candidate::{CandidateGenerator, IntersectCandidate};
use crate::intersection::{IntersectedField, Intersection};
use crate::rules::RuleChain;

/// Runs candidates through the rule chain.
///
/// A rejected collection pairing is retried on its element types; any other
/// rejected pairing of two complex fields is expanded one level deeper.
#[derive(Debug, Clone, Default)]
pub struct IntersectionAnalyzer {
    generator: CandidateGenerator,
    rules: RuleChain,
}

impl IntersectionAnalyzer {
    #[must_use]
    pub const fn new(generator: CandidateGenerator, rules: RuleChain) -> Self {
        Self { generator, rules }
    }

    #[must_use]
    pub const fn from_config(config: &AnalysisConfig, rules: RuleChain) -> Self {
        Self::new(CandidateGenerator::from_config(config), rules)
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleChain {
        &self.rules
    }

    #[must_use]
    pub fn analyze(&self, left: &Model, right: &Model) -> Intersection {
        let mut queue: VecDeque<_> = self.generator.roots(left, right).into();
        let mut seen: HashSet<(FieldPath, FieldPath)> = HashSet::new();
        let mut fields = Vec::new();

        while let Some(candidate) = queue.pop_front() {
            if !seen.insert((candidate.left().clone(), candidate.right().clone())) {
                continue;
            }
            if let Some(accepted) = self.rules.evaluate(&candidate) {
                fields.push(accepted);
                continue;
            }
            if let Some(accepted) = self.accept_elements(&candidate) {
                fields.push(accepted);
                continue;
            }
            queue.extend(self.generator.expand(&candidate));
        }

        tracing::debug!(
            left = %left,
            right = %right,
            fields = fields.len(),
            "intersection analyzed"
        );
        Intersection::new(left.clone(), right.clone(), fields)
    }

    fn accept_elements(&self, candidate: &IntersectCandidate) -> Option<IntersectedField> {
        let target = candidate.right_field().container_kind()?;
        let element = candidate.element_candidate()?;
        self.rules
            .evaluate(&element)
            .map(|accepted| accepted.into_collection(target))
    }
}
