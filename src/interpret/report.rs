use super::classifier::Classifier;
use super::interpreter::Interpreter;
use super::reinforce::Reinforcer;
use serde_json::json;

/// JSON contribution report for the bound observation: per target
/// value, the ranked attributes with their source parts and Shapley
/// contributions
pub fn contributions<C: Classifier>(interpreter: &Interpreter<'_, C>) -> serde_json::Value {
    let classifier = interpreter.classifier();
    let targets = (0..classifier.target_value_count())
        .map(|target| {
            json!({
                "target": classifier.target_value_at(target),
                "prob": classifier.target_prob_at(target),
                "contributions": (0..interpreter.attribute_count())
                    .map(|rank| json!({
                        "attribute": interpreter.ranked_contribution_attribute_at(target, rank),
                        "part": interpreter.ranked_contribution_part_at(target, rank),
                        "value": interpreter.ranked_contribution_value_at(target, rank),
                    }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();
    json!({ "targets": targets })
}

/// JSON reinforcement report for one target value; levers with no
/// improving move are left out
pub fn reinforcements<C: Classifier>(
    reinforcer: &Reinforcer<'_, C>,
    target_value: &str,
) -> serde_json::Value {
    let moves = (0..reinforcer.lever_count())
        .filter_map(|rank| {
            let attribute = reinforcer.ranked_reinforcement_attribute_at(target_value, rank)?;
            Some(json!({
                "attribute": attribute,
                "part": reinforcer.ranked_reinforcement_part_at(target_value, rank),
                "final_score": reinforcer.ranked_reinforcement_final_score_at(target_value, rank),
                "class_change_tag":
                    reinforcer.ranked_reinforcement_class_change_tag_at(target_value, rank),
            }))
        })
        .collect::<Vec<_>>();
    json!({
        "target": target_value,
        "initial_score": reinforcer.initial_score_at(target_value),
        "reinforcements": moves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::mock::MockClassifier;

    #[test]
    fn contribution_report_covers_all_targets() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[0, 1]);
        let mut interpreter = Interpreter::new(&classifier).unwrap();
        interpreter.bind_observation();
        let report = contributions(&interpreter);
        let targets = report["targets"].as_array().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0]["contributions"].as_array().unwrap().len(), 2);
        assert!(targets[0]["prob"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn reinforcement_report_drops_non_moves() {
        let classifier = MockClassifier::standard();
        classifier.bind(&[0, 0]);
        let mut reinforcer = Reinforcer::new(&classifier, &["age"]).unwrap();
        reinforcer.bind_observation();
        // nothing improves "yes" from the best cells
        let report = reinforcements(&reinforcer, "yes");
        assert!(report["reinforcements"].as_array().unwrap().is_empty());
        assert!(report["initial_score"].as_f64().unwrap() > 0.5);
    }
}
