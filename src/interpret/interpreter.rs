use super::classifier::Classifier;
use super::contribution::AttributeContribution;
use super::service::Service;
use super::shapley::ShapleyTable;
use anyhow::Context;
use anyhow::Result;
use std::cell::RefCell;

/// per-observation Shapley interpretation of a compiled classifier.
///
/// compilation builds one Shapley table per prepared attribute from
/// its exported grid and the classifier's target value frequencies.
/// binding an observation refreshes the source-cell index vector and
/// invalidates the ranked cache; rankings are then sorted lazily, once
/// per (observation, target).
pub struct Interpreter<'a, C: Classifier> {
    service: Service<'a, C>,
    tables: Vec<ShapleyTable>,
    ranked: RefCell<Vec<Option<Vec<AttributeContribution>>>>,
}

impl<'a, C: Classifier> Interpreter<'a, C> {
    pub fn new(classifier: &'a C) -> Result<Self> {
        let service = Service::new(classifier)?;
        let targets = (0..classifier.target_value_count())
            .map(|t| classifier.target_value_at(t).to_string())
            .collect::<Vec<_>>();
        anyhow::ensure!(targets.len() > 1, "at least two target values");
        let frequencies = (0..targets.len())
            .map(|t| classifier.target_frequency_at(t))
            .collect::<Vec<_>>();
        let tables = (0..service.attribute_count())
            .map(|attribute| {
                ShapleyTable::from_data_grid(
                    &targets,
                    &frequencies,
                    service.grid_at(attribute),
                    classifier.attribute_weight_at(attribute),
                )
                .with_context(|| format!("shapley table for {}", service.name_at(attribute)))
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "compiled interpreter: {} attributes x {} target values",
            service.attribute_count(),
            targets.len()
        );
        let ranked = RefCell::new(vec![None; targets.len()]);
        Ok(Self {
            service,
            tables,
            ranked,
        })
    }

    pub fn classifier(&self) -> &'a C {
        self.service.classifier()
    }
    pub fn attribute_count(&self) -> usize {
        self.service.attribute_count()
    }
    pub fn attribute_name_at(&self, attribute: usize) -> &str {
        self.service.name_at(attribute)
    }
    pub fn shapley_table_at(&self, attribute: usize) -> &ShapleyTable {
        &self.tables[attribute]
    }

    /// pull the source-cell index of every prepared attribute for the
    /// classifier's current observation and drop the ranked cache
    pub fn bind_observation(&mut self) {
        self.service.bind_observation();
        self.ranked
            .replace(vec![None; self.classifier().target_value_count()]);
    }

    /// direct table lookup, no ranking involved
    pub fn contribution_at(&self, target: usize, attribute: usize) -> f64 {
        self.tables[attribute].value_at(self.service.source_index_at(attribute), target)
    }

    pub fn ranked_contribution_attribute_at(&self, target: usize, rank: usize) -> &str {
        let attribute = self.ranked_at(target, rank, |c| c.attribute);
        self.service.name_at(attribute)
    }

    pub fn ranked_contribution_value_at(&self, target: usize, rank: usize) -> f64 {
        self.ranked_at(target, rank, |c| c.contribution)
    }

    /// source-part label of the ranked attribute, reconstructed from
    /// the grid's partition (pair label for bivariate grids)
    pub fn ranked_contribution_part_at(&self, target: usize, rank: usize) -> String {
        let attribute = self.ranked_at(target, rank, |c| c.attribute);
        self.service.source_cell_label_at(attribute)
    }

    fn ranked_at<R>(
        &self,
        target: usize,
        rank: usize,
        read: impl FnOnce(&AttributeContribution) -> R,
    ) -> R {
        assert!(target < self.classifier().target_value_count());
        assert!(rank < self.attribute_count());
        let mut cache = self.ranked.borrow_mut();
        let ranked = cache[target].get_or_insert_with(|| {
            let mut contributions = (0..self.attribute_count())
                .map(|attribute| AttributeContribution {
                    attribute,
                    contribution: self.contribution_at(target, attribute),
                })
                .collect::<Vec<_>>();
            contributions
                .sort_by(|a, b| AttributeContribution::compare(a, b, self.service.names()));
            contributions
        });
        read(&ranked[rank])
    }

    /// source cell of an attribute for the bound observation
    pub fn source_index_at(&self, attribute: usize) -> usize {
        self.service.source_index_at(attribute)
    }

    /// diagnostic rendering including the per-attribute Shapley tables
    pub fn write_details(&self) -> String {
        let mut out = self.service.details();
        for (attribute, table) in self.tables.iter().enumerate() {
            out.push_str(&format!(
                "    ####  Shapley values ({})\n{}",
                self.service.name_at(attribute),
                table
            ));
        }
        out
    }
}
