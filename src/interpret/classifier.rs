use super::grid::DataGrid;
use crate::Probability;
use crate::Weight;

/// compiled statistics of one prepared attribute. the current source
/// cell is per-observation state maintained by the host behind a
/// shared reference, as the rest of the view is.
pub trait GridStats {
    /// source cell of the bound observation
    fn cell_index(&self) -> usize;
    /// ln p(source part | target part), as used by the classifier's
    /// numerator terms
    fn source_conditional_log_prob_at(&self, source: usize, target: usize) -> Probability;
    /// compile-time export of the underlying grid
    fn export(&self) -> DataGrid;
}

/// sparse block of prepared attributes. only keys present on the
/// bound observation report a cell; absent members fall back to the
/// default source part.
pub trait GridBlock {
    /// member grids, in block order
    fn grid_count(&self) -> usize;
    fn grid_stats_at(&self, member: usize) -> &dyn GridStats;
    /// default source part for an absent key: the attribute block's
    /// default value mapped through the member's univariate partition
    fn default_source_index_at(&self, member: usize) -> usize;

    /// keys present on the bound observation
    fn value_count(&self) -> usize;
    /// source cell of the i-th present key, 1-based; consumers shift
    /// to 0-based
    fn cell_index_at(&self, value: usize) -> usize;
    /// block member owning the i-th present key
    fn grid_index_at(&self, value: usize) -> usize;
}

/// one prepared entry of the classifier
pub enum Prepared<'a> {
    Grid(&'a dyn GridStats),
    Block(&'a dyn GridBlock),
}

/// narrow indexed view of a compiled naive-Bayes-family classifier.
/// everything the interpreter and reinforcer consume goes through
/// this interface; the training pipeline and rule machinery behind it
/// stay out of scope.
pub trait Classifier {
    // target values
    fn target_value_count(&self) -> usize;
    fn target_value_at(&self, target: usize) -> &str;
    fn target_value_rank(&self, value: &str) -> Option<usize> {
        (0..self.target_value_count()).find(|&t| self.target_value_at(t) == value)
    }
    /// observed frequency of the target value in the training data
    fn target_frequency_at(&self, target: usize) -> u64;

    // prepared attributes; blocks flatten into the attribute order
    fn prepared_count(&self) -> usize;
    fn prepared_at(&self, index: usize) -> Prepared<'_>;
    fn attribute_name_at(&self, attribute: usize) -> &str;
    fn attribute_weight_at(&self, attribute: usize) -> Weight;

    // per-observation scores
    /// index of the predicted target value for the bound observation
    fn predicted_target(&self) -> usize;
    fn target_prob_at(&self, target: usize) -> Probability;
    /// numerator terms of the class log-probabilities, one per target
    fn log_prob_numerator_terms(&self) -> Vec<f64>;
    /// target part index of a target value within an attribute's grid
    fn target_cell_index_at(&self, attribute: usize, target: usize) -> usize;

    /// normalize numerator terms into target probabilities
    fn probs_from_numerator_terms(&self, terms: &[f64], probs: &mut [Probability]) {
        assert!(terms.len() == probs.len());
        let max = terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut total = 0.0;
        for (term, prob) in terms.iter().zip(probs.iter_mut()) {
            *prob = (term - max).exp();
            total += *prob;
        }
        for prob in probs.iter_mut() {
            *prob /= total;
        }
    }
}
