use crate::compare_indicator;
use serde::Serialize;
use std::cmp::Ordering;

/// one attribute's Shapley contribution to a target value for the
/// bound observation. rebuilt per observation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AttributeContribution {
    pub attribute: usize,
    pub contribution: f64,
}

impl AttributeContribution {
    /// contribution descending under the epsilon-stable comparison,
    /// attribute name as the deterministic tiebreak
    pub fn compare(a: &Self, b: &Self, names: &[String]) -> Ordering {
        compare_indicator(b.contribution, a.contribution)
            .then_with(|| names[a.attribute].cmp(&names[b.attribute]))
    }
}
