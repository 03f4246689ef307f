use super::classifier::Classifier;
use super::service::Service;
use crate::Probability;
use crate::compare_indicator;
use anyhow::Result;
use serde::Serialize;
use std::cell::RefCell;
use std::cmp::Ordering;

/// outcome of the greedy single-move search for one lever attribute:
/// the alternative source part maximizing the target's probability,
/// the score it reaches, and whether the move flips the predicted
/// class. score 0 denotes "no improvement". rebuilt lazily per
/// (observation, target).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AttributeReinforcement {
    pub attribute: usize,
    pub part: usize,
    pub score: Probability,
    pub tag: i32,
}

impl AttributeReinforcement {
    /// final score descending under the epsilon-stable comparison,
    /// attribute name as the deterministic tiebreak
    pub fn compare(a: &Self, b: &Self, names: &[String]) -> Ordering {
        compare_indicator(b.score, a.score)
            .then_with(|| names[a.attribute].cmp(&names[b.attribute]))
    }
}

/// greedy reinforcement search over a declared subset of lever
/// attributes. overlays the same compiled indexed view as the
/// interpreter and explores alternative source parts through the
/// classifier's log-probability numerator terms.
pub struct Reinforcer<'a, C: Classifier> {
    service: Service<'a, C>,
    levers: Vec<usize>,
    ranked: RefCell<Vec<Option<Vec<AttributeReinforcement>>>>,
}

impl<'a, C: Classifier> Reinforcer<'a, C> {
    pub fn new(classifier: &'a C, lever_names: &[&str]) -> Result<Self> {
        let service = Service::new(classifier)?;
        anyhow::ensure!(!lever_names.is_empty(), "no reinforcement attributes");
        let mut levers = Vec::with_capacity(lever_names.len());
        for &name in lever_names {
            let attribute = service
                .attribute_rank(name)
                .ok_or_else(|| anyhow::anyhow!("unknown reinforcement attribute {}", name))?;
            anyhow::ensure!(
                !levers.contains(&attribute),
                "reinforcement attribute {} used twice",
                name
            );
            levers.push(attribute);
        }
        let ranked = RefCell::new(vec![None; classifier.target_value_count()]);
        Ok(Self {
            service,
            levers,
            ranked,
        })
    }

    pub fn classifier(&self) -> &'a C {
        self.service.classifier()
    }
    pub fn lever_count(&self) -> usize {
        self.levers.len()
    }
    pub fn lever_name_at(&self, rank: usize) -> &str {
        self.service.name_at(self.levers[rank])
    }

    pub fn bind_observation(&mut self) {
        self.service.bind_observation();
        self.ranked
            .replace(vec![None; self.classifier().target_value_count()]);
    }

    /// the classifier's unmodified score for a target value
    pub fn initial_score_at(&self, target_value: &str) -> Option<Probability> {
        let target = self.classifier().target_value_rank(target_value)?;
        Some(self.classifier().target_prob_at(target))
    }

    pub fn ranked_reinforcement_attribute_at(
        &self,
        target_value: &str,
        rank: usize,
    ) -> Option<&str> {
        self.ranked_at(target_value, rank, |r| r.attribute)
            .map(|attribute| self.service.name_at(attribute))
    }

    /// label of the winning alternative source part
    pub fn ranked_reinforcement_part_at(&self, target_value: &str, rank: usize) -> Option<String> {
        let (attribute, part) = self.ranked_at(target_value, rank, |r| (r.attribute, r.part))?;
        Some(self.service.grid_at(attribute).source().label_at(part))
    }

    pub fn ranked_reinforcement_final_score_at(
        &self,
        target_value: &str,
        rank: usize,
    ) -> Option<Probability> {
        self.ranked_at(target_value, rank, |r| r.score)
    }

    /// 0 when the class was already the target, +1 when the move
    /// makes it the argmax, -1 otherwise
    pub fn ranked_reinforcement_class_change_tag_at(
        &self,
        target_value: &str,
        rank: usize,
    ) -> Option<i32> {
        self.ranked_at(target_value, rank, |r| r.tag)
    }

    /// None for an unknown target, an out-of-range rank, or a lever
    /// with no improving move
    fn ranked_at<R>(
        &self,
        target_value: &str,
        rank: usize,
        read: impl FnOnce(&AttributeReinforcement) -> R,
    ) -> Option<R> {
        let target = self.classifier().target_value_rank(target_value)?;
        if rank >= self.levers.len() {
            return None;
        }
        let mut cache = self.ranked.borrow_mut();
        let ranked = cache[target].get_or_insert_with(|| {
            let initial = self.classifier().predicted_target();
            let mut reinforcements = self
                .levers
                .iter()
                .map(|&attribute| self.reinforcement_at(target, attribute, initial))
                .collect::<Vec<_>>();
            reinforcements
                .sort_by(|a, b| AttributeReinforcement::compare(a, b, self.service.names()));
            reinforcements
        });
        let reinforcement = &ranked[rank];
        if reinforcement.score == 0.0 {
            None
        } else {
            Some(read(reinforcement))
        }
    }

    /// try every alternative source part of the lever, rescoring all
    /// classes from the snapshotted numerator terms; keep the part
    /// with the epsilon-stable best score for the target
    fn reinforcement_at(
        &self,
        target: usize,
        attribute: usize,
        initial_predicted: usize,
    ) -> AttributeReinforcement {
        let classifier = self.classifier();
        let weight = classifier.attribute_weight_at(attribute);
        let stats = self.service.stats_at(attribute);
        let grid = self.service.grid_at(attribute);
        let current = self.service.source_index_at(attribute);
        let targets = classifier.target_value_count();
        let initial_score = classifier.target_prob_at(target);

        let mut best = AttributeReinforcement {
            attribute,
            part: 0,
            score: 0.0,
            tag: 0,
        };
        let mut final_score = initial_score;
        let mut scores = vec![0.0; targets];
        for source in 0..grid.source_part_count() {
            if source == current {
                continue;
            }
            let mut terms = classifier.log_prob_numerator_terms();
            for (t, term) in terms.iter_mut().enumerate() {
                let part = classifier.target_cell_index_at(attribute, t);
                let delta = stats.source_conditional_log_prob_at(source, part)
                    - stats.source_conditional_log_prob_at(current, part);
                *term += weight * delta;
            }
            classifier.probs_from_numerator_terms(&terms, &mut scores);
            let score = scores[target];
            assert!((0.0..=1.0).contains(&score));
            if compare_indicator(score, final_score) == Ordering::Greater {
                final_score = score;
                let predicted = Self::argmax(&scores);
                best.part = source;
                best.score = score;
                best.tag = if initial_predicted == target {
                    0
                } else if predicted == target {
                    1
                } else {
                    -1
                };
            }
        }
        best
    }

    fn argmax(scores: &[Probability]) -> usize {
        let mut arg = 0;
        let mut max = 0.0;
        for (target, &score) in scores.iter().enumerate() {
            assert!(score > 0.0);
            if score > max {
                max = score;
                arg = target;
            }
        }
        arg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::mock::MockClassifier;

    #[test]
    fn moving_the_lever_reaches_the_rebound_score() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[1, 1]);
        let mut reinforcer = Reinforcer::new(&classifier, &["age"]).unwrap();
        reinforcer.bind_observation();
        // switching age to part 0 should be the winning move for "yes"
        let score = reinforcer
            .ranked_reinforcement_final_score_at("yes", 0)
            .expect("an improving move exists");
        let part = reinforcer.ranked_reinforcement_part_at("yes", 0).unwrap();
        assert_eq!(part, "low");
        // the reinforced score equals the actual score after the move
        classifier.bind(&[0, 1]);
        let rebound = classifier.target_prob_at(0);
        assert!((score - rebound).abs() < 1e-12);
    }

    #[test]
    fn reinforcement_leaves_the_classifier_untouched() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[1, 1]);
        let before = classifier.target_prob_at(0);
        let mut reinforcer = Reinforcer::new(&classifier, &["age", "income"]).unwrap();
        reinforcer.bind_observation();
        reinforcer.ranked_reinforcement_final_score_at("yes", 0);
        assert_eq!(before, classifier.target_prob_at(0));
    }

    #[test]
    fn no_improvement_reports_none() {
        let classifier = MockClassifier::standard();
        // already in the most favorable cells for "yes"
        classifier.bind(&[0, 0]);
        let mut reinforcer = Reinforcer::new(&classifier, &["age"]).unwrap();
        reinforcer.bind_observation();
        assert!(
            reinforcer
                .ranked_reinforcement_final_score_at("yes", 0)
                .is_none()
        );
        assert!(
            reinforcer
                .ranked_reinforcement_attribute_at("yes", 0)
                .is_none()
        );
    }

    #[test]
    fn class_change_tags() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[1, 1]);
        let mut reinforcer = Reinforcer::new(&classifier, &["age", "income"]).unwrap();
        reinforcer.bind_observation();
        // prediction is "no"; reinforcing "no" further is tag 0
        if let Some(tag) = reinforcer.ranked_reinforcement_class_change_tag_at("no", 0) {
            assert_eq!(tag, 0);
        }
        // reinforcing "yes" with the age lever flips the argmax
        let tag = reinforcer
            .ranked_reinforcement_class_change_tag_at("yes", 0)
            .expect("an improving move exists");
        assert!(tag == 1 || tag == -1);
    }

    #[test]
    fn levers_rank_by_final_score() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[1, 1]);
        let mut reinforcer = Reinforcer::new(&classifier, &["age", "income"]).unwrap();
        reinforcer.bind_observation();
        // the heavier, sharper grid is the stronger lever
        assert_eq!(
            reinforcer.ranked_reinforcement_attribute_at("yes", 0),
            Some("age")
        );
        let first = reinforcer
            .ranked_reinforcement_final_score_at("yes", 0)
            .unwrap();
        let second = reinforcer
            .ranked_reinforcement_final_score_at("yes", 1)
            .unwrap();
        assert!(first >= second);
    }

    #[test]
    fn unknown_targets_and_ranks_are_none() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[1, 1]);
        let mut reinforcer = Reinforcer::new(&classifier, &["age"]).unwrap();
        reinforcer.bind_observation();
        assert!(
            reinforcer
                .ranked_reinforcement_final_score_at("maybe", 0)
                .is_none()
        );
        assert!(
            reinforcer
                .ranked_reinforcement_final_score_at("yes", 5)
                .is_none()
        );
    }

    #[test]
    fn duplicate_levers_are_rejected() {
        let classifier = MockClassifier::standard();
        assert!(Reinforcer::new(&classifier, &["age", "age"]).is_err());
        assert!(Reinforcer::new(&classifier, &["unknown"]).is_err());
    }
}
