use super::grid::DataGrid;
use crate::Weight;
use anyhow::Result;
use serde::Serialize;

/// per-attribute table of Shapley values keyed by (source part,
/// target value). built once at compile time, immutable thereafter.
///
/// the value is the one-vs-all log-odds of the source conditional,
/// centered on the source-marginal expectation and scaled by the
/// attribute's weight in the classifier. rows are computed per target
/// value rather than per target part: with grouped targets, the
/// piecewise-uniform density assumption prorates a part's cells by
/// each member value's share.
#[derive(Debug, Clone, Serialize)]
pub struct ShapleyTable {
    sources: usize,
    targets: usize,
    values: Vec<f64>,
}

impl ShapleyTable {
    pub fn from_data_grid(
        target_values: &[String],
        target_value_frequencies: &[u64],
        grid: &DataGrid,
        weight: Weight,
    ) -> Result<Self> {
        anyhow::ensure!(target_values.len() > 1, "at least two target values");
        anyhow::ensure!(target_value_frequencies.len() == target_values.len());
        anyhow::ensure!(grid.source_part_count() > 1, "degenerate source partition");
        anyhow::ensure!(grid.target_part_count() > 1, "degenerate target partition");
        anyhow::ensure!(grid.target_part_count() <= target_values.len());
        anyhow::ensure!(weight > 0.0, "attribute weight must be positive");

        let sources = grid.source_part_count();
        let target_parts = grid.target_part_count();
        let total = grid.total_frequency() as f64;
        let singletons = grid.target().are_singletons();

        // one epsilon for the part of interest, (parts - 1) for the rest;
        // total-plus-one denominator sidesteps empty-grid edge effects
        let epsilon = 1.0 / (total + 1.0);

        let mut table = Self {
            sources,
            targets: target_values.len(),
            values: vec![0.0; sources * target_values.len()],
        };
        for (target, value) in target_values.iter().enumerate() {
            let part = grid
                .target()
                .part_index_of(value)
                .ok_or_else(|| anyhow::anyhow!("target value {} missing from the grid", value))?;
            let value_frequency = target_value_frequencies[target] as f64;
            let part_frequency = grid.target_frequency_at(part) as f64;

            // grouped targets prorate by the value's share of its part
            let share = value_frequency / part_frequency;
            let epsilon_one = if singletons { epsilon } else { epsilon * share };
            let epsilon_all = target_parts as f64 * epsilon - epsilon_one;

            let mut expectation = 0.0;
            for source in 0..sources {
                let mut one = grid.frequency_at(source, part) as f64;
                if !singletons {
                    one *= share;
                }
                let all = grid.source_frequency_at(source) as f64 - one;
                let prob_one =
                    (one + epsilon_one) / (value_frequency + sources as f64 * epsilon_one);
                let prob_all = (all + epsilon_all)
                    / (total - value_frequency + sources as f64 * epsilon_all);
                let term = (prob_one / prob_all).ln();
                table.values[source * table.targets + target] = term;
                expectation += (grid.source_frequency_at(source) as f64 / total) * term;
            }
            for source in 0..sources {
                let term = table.values[source * table.targets + target];
                table.values[source * table.targets + target] = weight * (term - expectation);
            }
        }
        Ok(table)
    }

    pub fn source_count(&self) -> usize {
        self.sources
    }
    pub fn target_count(&self) -> usize {
        self.targets
    }

    pub fn value_at(&self, source: usize, target: usize) -> f64 {
        assert!(source < self.sources && target < self.targets);
        self.values[source * self.targets + target]
    }
}

impl std::fmt::Display for ShapleyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Target\tShapley Value")?;
        for target in 0..self.targets {
            write!(f, "\tT{}", target + 1)?;
        }
        writeln!(f)?;
        for source in 0..self.sources {
            write!(f, "S{}", source + 1)?;
            for target in 0..self.targets {
                write!(f, "\t{}", self.value_at(source, target))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
