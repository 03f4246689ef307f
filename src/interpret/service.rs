use super::classifier::Classifier;
use super::classifier::GridStats;
use super::classifier::Prepared;
use super::grid::DataGrid;
use anyhow::Result;

/// compiled indexed view shared by the interpreter and the
/// reinforcer: the flattened attribute list (sparse blocks contribute
/// one attribute per member grid), exported data grids, per-attribute
/// stats handles, sparse defaults, and the bound observation's
/// source-cell index vector.
pub struct Service<'a, C: Classifier> {
    classifier: &'a C,
    names: Vec<String>,
    grids: Vec<DataGrid>,
    stats: Vec<&'a dyn GridStats>,
    defaults: Vec<usize>,
    sources: Vec<usize>,
    bound: bool,
}

impl<'a, C: Classifier> Service<'a, C> {
    pub fn new(classifier: &'a C) -> Result<Self> {
        let mut names = Vec::new();
        let mut grids = Vec::new();
        let mut stats: Vec<&'a dyn GridStats> = Vec::new();
        let mut defaults = Vec::new();
        for entry in 0..classifier.prepared_count() {
            match classifier.prepared_at(entry) {
                Prepared::Grid(grid_stats) => {
                    grids.push(grid_stats.export());
                    stats.push(grid_stats);
                    // dense attributes bind directly, no default part
                    defaults.push(0);
                    names.push(classifier.attribute_name_at(names.len()).to_string());
                }
                Prepared::Block(block) => {
                    for member in 0..block.grid_count() {
                        let grid_stats = block.grid_stats_at(member);
                        grids.push(grid_stats.export());
                        stats.push(grid_stats);
                        defaults.push(block.default_source_index_at(member));
                        names.push(classifier.attribute_name_at(names.len()).to_string());
                    }
                }
            }
        }
        anyhow::ensure!(!names.is_empty(), "classifier exposes no prepared attributes");
        for (attribute, grid) in grids.iter().enumerate() {
            anyhow::ensure!(
                defaults[attribute] < grid.source_part_count(),
                "default source part out of range for {}",
                names[attribute]
            );
        }
        log::debug!("compiled service over {} prepared attributes", names.len());
        let sources = defaults.clone();
        Ok(Self {
            classifier,
            names,
            grids,
            stats,
            defaults,
            sources,
            bound: false,
        })
    }

    /// refresh the source-cell index vector from the classifier's
    /// bound observation: defaults first, then the cells the sparse
    /// blocks report for present keys (1-based, shifted here)
    pub fn bind_observation(&mut self) {
        self.sources.copy_from_slice(&self.defaults);
        let mut attribute = 0;
        for entry in 0..self.classifier.prepared_count() {
            match self.classifier.prepared_at(entry) {
                Prepared::Grid(grid_stats) => {
                    self.sources[attribute] = grid_stats.cell_index();
                    attribute += 1;
                }
                Prepared::Block(block) => {
                    for value in 0..block.value_count() {
                        let member = block.grid_index_at(value);
                        self.sources[attribute + member] = block.cell_index_at(value) - 1;
                    }
                    attribute += block.grid_count();
                }
            }
        }
        self.bound = true;
    }

    pub fn classifier(&self) -> &'a C {
        self.classifier
    }
    pub fn is_bound(&self) -> bool {
        self.bound
    }
    pub fn attribute_count(&self) -> usize {
        self.names.len()
    }
    pub fn names(&self) -> &[String] {
        &self.names
    }
    pub fn name_at(&self, attribute: usize) -> &str {
        &self.names[attribute]
    }
    pub fn grid_at(&self, attribute: usize) -> &DataGrid {
        &self.grids[attribute]
    }
    pub fn stats_at(&self, attribute: usize) -> &'a dyn GridStats {
        self.stats[attribute]
    }

    pub fn source_index_at(&self, attribute: usize) -> usize {
        assert!(self.bound, "no observation bound");
        self.sources[attribute]
    }

    /// label of the bound observation's source part for an attribute
    pub fn source_cell_label_at(&self, attribute: usize) -> String {
        self.grids[attribute]
            .source()
            .label_at(self.source_index_at(attribute))
    }

    /// index of a predictor attribute by name
    pub fn attribute_rank(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// diagnostic rendering: target values, then per-attribute weight,
    /// name and grid dimensions
    pub fn details(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            " ## Target values\t{}\n",
            self.classifier.target_value_count()
        ));
        for target in 0..self.classifier.target_value_count() {
            out.push_str(&format!("\t{}\n", self.classifier.target_value_at(target)));
        }
        out.push_str(&format!(
            " ## Predictor variables\t{}\n",
            self.attribute_count()
        ));
        for attribute in 0..self.attribute_count() {
            out.push_str(&format!(
                "  ### {}\t{}\t{}\n",
                attribute + 1,
                self.classifier.attribute_weight_at(attribute),
                self.name_at(attribute)
            ));
            let grid = self.grid_at(attribute);
            out.push_str(&format!(
                "    ####  Data grid\t{}x{}\n{}",
                grid.source_part_count(),
                grid.target_part_count(),
                grid
            ));
        }
        out
    }
}
