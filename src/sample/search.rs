use super::indexed::IndexedFrequency;
use super::ordered::OrderedMap;
use crate::Frequency;
use crate::Probability;
use std::cmp::Ordering;

type Compare = fn(&IndexedFrequency, &IndexedFrequency) -> Ordering;

/// bounded depth-first search for the top joint cells of a product or
/// selection law.
///
/// dimensions arrive probability-descending, so the first completed
/// cell is the global mode and every break below cuts a whole
/// monotone suffix. at most `total` cells are ever worth keeping: a
/// cell can only receive frequency if its probability survives the
/// (N + 2 - kept) pruning factor against the mode.
pub struct CellSearch {
    total: Frequency,
    largest: Probability,
    kept: OrderedMap<IndexedFrequency, Compare>,
}

impl CellSearch {
    pub fn new(total: Frequency, largest: Probability) -> Self {
        assert!(largest > 0.0);
        Self {
            total,
            largest,
            kept: OrderedMap::new(IndexedFrequency::by_prob_descending),
        }
    }

    /// recursive expansion over a product of distributions: one sorted
    /// (index, prob) vector per dimension
    pub fn expand_product(
        &mut self,
        dims: &[Vec<(usize, Probability)>],
        dim: usize,
        current: &mut IndexedFrequency,
    ) {
        let prefix = current.prob();
        for &(index, prob) in &dims[dim] {
            current.set_index_at(dim, index);
            current.set_prob(prefix * prob);
            if self.discardable(current.prob()) {
                break;
            }
            if dim == dims.len() - 1 {
                self.keep(current.clone());
            } else {
                self.expand_product(dims, dim + 1, current);
            }
            if self.saturated() {
                break;
            }
        }
    }

    /// recursive expansion over k-subset selections of one sorted
    /// vector. ascending positions per level rule out permutations of
    /// the same subset; the k! selection factor accumulates one
    /// (step+1) per level.
    pub fn expand_selection(
        &mut self,
        sorted: &[(usize, Probability)],
        size: usize,
        dim: usize,
        start: usize,
        current: &mut IndexedFrequency,
    ) {
        let prefix = current.prob();
        // leave room for the remaining size - 1 - dim deeper levels
        let last = sorted.len() - (size - 1 - dim);
        for at in start..last {
            let (index, prob) = sorted[at];
            current.set_index_at(dim, index);
            // each factor p * (step+1) stays below 1 because the
            // probabilities are sorted descending
            debug_assert!(prob * (dim + 1) as f64 <= 1.0 + 1e-5);
            current.set_prob(prefix * prob * (dim + 1) as f64);
            if self.discardable(current.prob()) {
                break;
            }
            if dim == size - 1 {
                let mut cell = current.clone();
                cell.canonicalize();
                debug_assert!(cell.check_strictly_increasing());
                self.keep(cell);
            } else {
                self.expand_selection(sorted, size, dim + 1, at + 1, current);
            }
            if self.saturated() {
                break;
            }
        }
    }

    /// kept cells, probability descending
    pub fn into_cells(mut self) -> Vec<IndexedFrequency> {
        let mut cells = Vec::with_capacity(self.kept.len());
        while let Some(cell) = self.kept.pop_head() {
            cells.push(cell);
        }
        cells
    }

    /// even granted every remaining unit, a cell this improbable
    /// cannot outrank the mode for a single draw
    fn discardable(&self, prob: Probability) -> bool {
        prob * (self.total + 2.0 - self.kept.len() as f64) < self.largest
    }

    fn saturated(&self) -> bool {
        self.kept.len() as f64 >= self.total
    }

    fn keep(&mut self, cell: IndexedFrequency) {
        self.kept.insert(cell);
        let tail = self.kept.tail().expect("just inserted").prob();
        if self.discardable(tail) {
            self.kept.pop_tail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descending(probs: &[f64]) -> Vec<(usize, f64)> {
        let mut sorted = probs.iter().copied().enumerate().collect::<Vec<_>>();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted
    }

    #[test]
    fn product_mode_comes_first() {
        let dims = vec![descending(&[0.1, 0.6, 0.3]), descending(&[0.2, 0.8])];
        let mut search = CellSearch::new(5.0, 0.6 * 0.8);
        let mut current = IndexedFrequency::new(2);
        current.set_prob(1.0);
        search.expand_product(&dims, 0, &mut current);
        let cells = search.into_cells();
        assert!(!cells.is_empty());
        assert_eq!(cells[0].index_at(0), 1);
        assert_eq!(cells[0].index_at(1), 1);
        for pair in cells.windows(2) {
            assert!(pair[0].prob() >= pair[1].prob());
        }
    }

    #[test]
    fn saturation_caps_the_kept_set() {
        let uniform = vec![0.1; 10];
        let dims = vec![descending(&uniform), descending(&uniform)];
        let mut search = CellSearch::new(3.0, 0.01);
        let mut current = IndexedFrequency::new(2);
        current.set_prob(1.0);
        search.expand_product(&dims, 0, &mut current);
        assert_eq!(search.into_cells().len(), 3);
    }

    #[test]
    fn selection_enumerates_canonical_subsets() {
        let sorted = descending(&[0.4, 0.3, 0.2, 0.1]);
        let largest = 0.4 * (0.3 * 2.0);
        let mut search = CellSearch::new(6.0, largest);
        let mut current = IndexedFrequency::new(2);
        current.set_prob(1.0);
        search.expand_selection(&sorted, 2, 0, 0, &mut current);
        let cells = search.into_cells();
        assert!(!cells.is_empty());
        assert!(cells.len() <= 6);
        for cell in &cells {
            assert!(cell.check_strictly_increasing());
        }
        // the top subset pairs the two most probable values
        assert_eq!(cells[0].index_at(0), 0);
        assert_eq!(cells[0].index_at(1), 1);
        assert!((cells[0].prob() - 0.24).abs() < 1e-12);
    }

    #[test]
    fn pruning_respects_the_mode_bound() {
        // one dominant cell: nothing else can receive a unit at N = 1
        let dims = vec![descending(&[0.98, 0.01, 0.01])];
        let mut search = CellSearch::new(1.0, 0.98);
        let mut current = IndexedFrequency::new(1);
        current.set_prob(1.0);
        search.expand_product(&dims, 0, &mut current);
        let cells = search.into_cells();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].index_at(0), 0);
    }
}
