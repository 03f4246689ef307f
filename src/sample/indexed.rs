use crate::Frequency;
use crate::Probability;
use serde::Serialize;

/// one joint cell of a product or selection law: an index per
/// dimension, the joint probability of the cell, and the frequency the
/// allocator assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexedFrequency {
    indexes: Vec<usize>,
    prob: Probability,
    frequency: Frequency,
}

impl IndexedFrequency {
    pub fn new(dimensions: usize) -> Self {
        Self {
            indexes: vec![0; dimensions],
            prob: 0.0,
            frequency: 0.0,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.indexes.len()
    }
    pub fn index_at(&self, dimension: usize) -> usize {
        self.indexes[dimension]
    }
    pub fn set_index_at(&mut self, dimension: usize, index: usize) {
        self.indexes[dimension] = index;
    }

    pub fn prob(&self) -> Probability {
        self.prob
    }
    pub fn set_prob(&mut self, prob: Probability) {
        assert!((0.0..=1.0).contains(&prob), "prob out of [0, 1]: {}", prob);
        self.prob = prob;
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }
    pub fn set_frequency(&mut self, frequency: Frequency) {
        assert!(frequency >= 0.0);
        assert!(
            crate::is_very_large_frequency(frequency)
                || (frequency - (frequency + 0.5).floor()).abs() < crate::FREQUENCY_EPSILON,
            "frequency must be integral below the precision threshold: {}",
            frequency
        );
        self.frequency = frequency;
    }

    /// sort indices ascending so that every permutation of the same
    /// k-subset maps to one representative. selection mode only.
    pub fn canonicalize(&mut self) {
        self.indexes.sort_unstable();
    }

    /// canonical form has strictly increasing indices
    pub fn check_strictly_increasing(&self) -> bool {
        self.indexes.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// ordering key for the top-K structure: probability descending.
    /// ties keep insertion order downstream, which is deterministic.
    pub fn by_prob_descending(a: &Self, b: &Self) -> std::cmp::Ordering {
        b.prob.total_cmp(&a.prob)
    }
}

impl std::fmt::Display for IndexedFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, index) in self.indexes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", index)?;
        }
        write!(f, ")\t{}\t{}", self.prob, self.frequency)
    }
}
