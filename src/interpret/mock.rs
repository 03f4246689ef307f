use super::classifier::Classifier;
use super::classifier::GridBlock;
use super::classifier::GridStats;
use super::classifier::Prepared;
use super::grid::DataGrid;
use super::grid::Partition;
use super::grid::SourceAxis;
use super::grid::TargetPartition;
use crate::Probability;
use crate::Weight;
use std::cell::Cell;
use std::cell::RefCell;

/// reference selective naive Bayes over the narrow classifier
/// contract, for exercising the interpreter and reinforcer. scores
/// are the real thing: class prior plus weighted source-conditional
/// log-probabilities of the bound cells.
pub struct MockClassifier {
    targets: Vec<String>,
    frequencies: Vec<u64>,
    entries: Vec<MockEntry>,
}

pub enum MockEntry {
    Dense(MockAttribute),
    Block(MockBlock),
}

pub struct MockAttribute {
    name: String,
    weight: Weight,
    grid: DataGrid,
    cell: Cell<usize>,
}

pub struct MockBlock {
    members: Vec<MockAttribute>,
    defaults: Vec<usize>,
    present: RefCell<Vec<(usize, usize)>>,
}

impl MockAttribute {
    fn new(name: &str, weight: Weight, labels: &[&str], cells: Vec<u64>) -> Self {
        let grid = DataGrid::new(
            SourceAxis::Single(
                Partition::new(name, labels.iter().map(|l| l.to_string()).collect()).unwrap(),
            ),
            TargetPartition::singletons(&["yes", "no"]),
            cells,
        )
        .unwrap();
        Self {
            name: name.to_string(),
            weight,
            grid,
            cell: Cell::new(0),
        }
    }
}

impl GridStats for MockAttribute {
    fn cell_index(&self) -> usize {
        self.cell.get()
    }
    fn source_conditional_log_prob_at(&self, source: usize, target: usize) -> Probability {
        self.grid.source_conditional_log_prob_at(source, target)
    }
    fn export(&self) -> DataGrid {
        self.grid.clone()
    }
}

impl GridBlock for MockBlock {
    fn grid_count(&self) -> usize {
        self.members.len()
    }
    fn grid_stats_at(&self, member: usize) -> &dyn GridStats {
        &self.members[member]
    }
    fn default_source_index_at(&self, member: usize) -> usize {
        self.defaults[member]
    }
    fn value_count(&self) -> usize {
        self.present.borrow().len()
    }
    fn cell_index_at(&self, value: usize) -> usize {
        self.present.borrow()[value].1
    }
    fn grid_index_at(&self, value: usize) -> usize {
        self.present.borrow()[value].0
    }
}

impl MockClassifier {
    /// two dense attributes: a sharp heavy one and a flatter light one
    pub fn standard() -> Self {
        Self {
            targets: vec!["yes".to_string(), "no".to_string()],
            frequencies: vec![50, 50],
            entries: vec![
                MockEntry::Dense(MockAttribute::new(
                    "age",
                    1.0,
                    &["low", "high"],
                    vec![40, 10, 10, 40],
                )),
                MockEntry::Dense(MockAttribute::new(
                    "income",
                    0.5,
                    &["small", "large"],
                    vec![30, 20, 20, 30],
                )),
            ],
        }
    }

    /// one dense attribute plus a sparse block of two members with
    /// default source part 0
    pub fn with_block() -> Self {
        Self {
            targets: vec!["yes".to_string(), "no".to_string()],
            frequencies: vec![50, 50],
            entries: vec![
                MockEntry::Dense(MockAttribute::new(
                    "age",
                    1.0,
                    &["low", "high"],
                    vec![40, 10, 10, 40],
                )),
                MockEntry::Block(MockBlock {
                    members: vec![
                        MockAttribute::new("word_a", 0.7, &["absent", "present"], vec![
                            35, 15, 15, 35,
                        ]),
                        MockAttribute::new("word_b", 0.3, &["absent", "present"], vec![
                            20, 30, 30, 20,
                        ]),
                    ],
                    defaults: vec![0, 0],
                    present: RefCell::new(Vec::new()),
                }),
            ],
        }
    }

    /// set the source cell of every flattened attribute; block members
    /// away from their default become present keys (1-based cells)
    pub fn bind(&self, cells: &[usize]) {
        assert!(cells.len() == self.attribute_count());
        let mut flat = 0;
        for entry in &self.entries {
            match entry {
                MockEntry::Dense(attribute) => {
                    attribute.cell.set(cells[flat]);
                    flat += 1;
                }
                MockEntry::Block(block) => {
                    let mut present = Vec::new();
                    for (member, attribute) in block.members.iter().enumerate() {
                        let cell = cells[flat + member];
                        attribute.cell.set(cell);
                        if cell != block.defaults[member] {
                            present.push((member, cell + 1));
                        }
                    }
                    block.present.replace(present);
                    flat += block.members.len();
                }
            }
        }
    }

    fn attribute_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                MockEntry::Dense(_) => 1,
                MockEntry::Block(block) => block.members.len(),
            })
            .sum()
    }

    fn attribute(&self, flat: usize) -> &MockAttribute {
        let mut remaining = flat;
        for entry in &self.entries {
            match entry {
                MockEntry::Dense(attribute) => {
                    if remaining == 0 {
                        return attribute;
                    }
                    remaining -= 1;
                }
                MockEntry::Block(block) => {
                    if remaining < block.members.len() {
                        return &block.members[remaining];
                    }
                    remaining -= block.members.len();
                }
            }
        }
        panic!("attribute {} out of range", flat);
    }

    fn probs(&self) -> Vec<Probability> {
        let terms = self.log_prob_numerator_terms();
        let mut probs = vec![0.0; terms.len()];
        self.probs_from_numerator_terms(&terms, &mut probs);
        probs
    }
}

impl Classifier for MockClassifier {
    fn target_value_count(&self) -> usize {
        self.targets.len()
    }
    fn target_value_at(&self, target: usize) -> &str {
        &self.targets[target]
    }
    fn target_frequency_at(&self, target: usize) -> u64 {
        self.frequencies[target]
    }

    fn prepared_count(&self) -> usize {
        self.entries.len()
    }
    fn prepared_at(&self, index: usize) -> Prepared<'_> {
        match &self.entries[index] {
            MockEntry::Dense(attribute) => Prepared::Grid(attribute),
            MockEntry::Block(block) => Prepared::Block(block),
        }
    }
    fn attribute_name_at(&self, attribute: usize) -> &str {
        &self.attribute(attribute).name
    }
    fn attribute_weight_at(&self, attribute: usize) -> Weight {
        self.attribute(attribute).weight
    }

    fn predicted_target(&self) -> usize {
        let probs = self.probs();
        probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(target, _)| target)
            .unwrap()
    }
    fn target_prob_at(&self, target: usize) -> Probability {
        self.probs()[target]
    }
    fn log_prob_numerator_terms(&self) -> Vec<f64> {
        let total = self.frequencies.iter().sum::<u64>() as f64;
        (0..self.targets.len())
            .map(|target| {
                let mut term = (self.frequencies[target] as f64 / total).ln();
                for flat in 0..self.attribute_count() {
                    let attribute = self.attribute(flat);
                    let part = self.target_cell_index_at(flat, target);
                    term += attribute.weight
                        * attribute
                            .grid
                            .source_conditional_log_prob_at(attribute.cell.get(), part);
                }
                term
            })
            .collect()
    }
    fn target_cell_index_at(&self, attribute: usize, target: usize) -> usize {
        self.attribute(attribute)
            .grid
            .target()
            .part_index_of(&self.targets[target])
            .unwrap()
    }
}
