use crate::Probability;
use anyhow::Result;
use serde::Serialize;

/// labelled parts of a prepared attribute's univariate partition
#[derive(Debug, Clone, Serialize)]
pub struct Partition {
    name: String,
    labels: Vec<String>,
}

impl Partition {
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Result<Self> {
        let name = name.into();
        anyhow::ensure!(!labels.is_empty(), "partition {} has no parts", name);
        Ok(Self { name, labels })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn len(&self) -> usize {
        self.labels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
    pub fn label_at(&self, part: usize) -> &str {
        &self.labels[part]
    }
}

/// source side of a data grid: a single partition, or a pair of
/// partitions flattened into cells c = s1 + s2 * n1
#[derive(Debug, Clone, Serialize)]
pub enum SourceAxis {
    Single(Partition),
    Pair(Partition, Partition),
}

impl SourceAxis {
    pub fn part_count(&self) -> usize {
        match self {
            Self::Single(partition) => partition.len(),
            Self::Pair(first, second) => first.len() * second.len(),
        }
    }

    /// part label of a source cell. pair cells decode as
    /// (c mod n1, c div n1).
    pub fn label_at(&self, cell: usize) -> String {
        match self {
            Self::Single(partition) => partition.label_at(cell).to_string(),
            Self::Pair(first, second) => {
                let index2 = cell / first.len();
                let index1 = cell % first.len();
                format!("{} x {}", first.label_at(index1), second.label_at(index2))
            }
        }
    }
}

/// target side of a data grid. parts may group several target values
/// (grouped-target classifier); values within a part share its cells
/// and are prorated by their observed share.
#[derive(Debug, Clone, Serialize)]
pub struct TargetPartition {
    parts: Vec<Vec<String>>,
}

impl TargetPartition {
    pub fn singletons(values: &[impl AsRef<str>]) -> Self {
        Self {
            parts: values
                .iter()
                .map(|value| vec![value.as_ref().to_string()])
                .collect(),
        }
    }

    pub fn grouped(parts: Vec<Vec<String>>) -> Result<Self> {
        anyhow::ensure!(!parts.is_empty(), "target partition has no parts");
        anyhow::ensure!(
            parts.iter().all(|members| !members.is_empty()),
            "target part with no member values"
        );
        Ok(Self { parts })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn are_singletons(&self) -> bool {
        self.parts.iter().all(|members| members.len() == 1)
    }

    pub fn part_index_of(&self, value: &str) -> Option<usize> {
        self.parts
            .iter()
            .position(|members| members.iter().any(|member| member == value))
    }

    pub fn label_at(&self, part: usize) -> String {
        self.parts[part].join(", ")
    }
}

/// cross-tabulation of one prepared source attribute against the
/// target, with per-cell frequencies. immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct DataGrid {
    source: SourceAxis,
    target: TargetPartition,
    cells: Vec<u64>,
}

impl DataGrid {
    /// cells are source-major: cells[s * target_parts + t]
    pub fn new(source: SourceAxis, target: TargetPartition, cells: Vec<u64>) -> Result<Self> {
        anyhow::ensure!(
            cells.len() == source.part_count() * target.len(),
            "cell count {} does not match {} x {} grid",
            cells.len(),
            source.part_count(),
            target.len()
        );
        Ok(Self {
            source,
            target,
            cells,
        })
    }

    pub fn source(&self) -> &SourceAxis {
        &self.source
    }
    pub fn target(&self) -> &TargetPartition {
        &self.target
    }
    pub fn source_part_count(&self) -> usize {
        self.source.part_count()
    }
    pub fn target_part_count(&self) -> usize {
        self.target.len()
    }

    pub fn frequency_at(&self, source: usize, target: usize) -> u64 {
        self.cells[source * self.target.len() + target]
    }

    pub fn source_frequency_at(&self, source: usize) -> u64 {
        (0..self.target.len())
            .map(|target| self.frequency_at(source, target))
            .sum()
    }

    pub fn target_frequency_at(&self, target: usize) -> u64 {
        (0..self.source.part_count())
            .map(|source| self.frequency_at(source, target))
            .sum()
    }

    pub fn total_frequency(&self) -> u64 {
        self.cells.iter().sum()
    }

    /// ln p(source part | target part) with 1/(N+1) Laplace smoothing,
    /// the conditional feeding the classifier's numerator terms
    pub fn source_conditional_log_prob_at(&self, source: usize, target: usize) -> Probability {
        let epsilon = 1.0 / (self.total_frequency() as f64 + 1.0);
        let joint = self.frequency_at(source, target) as f64;
        let marginal = self.target_frequency_at(target) as f64;
        let sources = self.source_part_count() as f64;
        ((joint + epsilon) / (marginal + sources * epsilon)).ln()
    }
}

impl std::fmt::Display for DataGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for target in 0..self.target.len() {
            write!(f, "\t{}", self.target.label_at(target))?;
        }
        writeln!(f)?;
        for source in 0..self.source.part_count() {
            write!(f, "{}", self.source.label_at(source))?;
            for target in 0..self.target.len() {
                write!(f, "\t{}", self.frequency_at(source, target))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
