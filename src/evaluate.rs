//! Accuracy of a trained model on held-out rows (non-strict threshold).

use serde::Serialize;
use tracing::{info, warn};

use crate::dataset::LabeledRow;
use crate::fighter::Corner;
use crate::model::Model;
use crate::scoring::{score, Threshold};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub correct: usize,
    /// Rows with a usable label (the accuracy denominator).
    pub counted: usize,
    /// Rows left out because their label did not parse.
    pub skipped: usize,
}

impl EvaluationReport {
    pub fn accuracy_pct(&self) -> f64 {
        if self.counted == 0 {
            0.0
        } else {
            self.correct as f64 / self.counted as f64 * 100.0
        }
    }
}

pub fn evaluate(model: &Model, rows: &[LabeledRow]) -> EvaluationReport {
    let mut report = EvaluationReport::default();
    for (i, row) in rows.iter().enumerate() {
        let predicted = match score(&row.features, model).winner(Threshold::Evaluation) {
            Corner::Red => 1,
            Corner::Blue => 0,
        };
        // Labels are whole numbers; anything else is excluded from accounting.
        let actual = match row.label {
            Some(l) if l.fract() == 0.0 => l as i64,
            _ => {
                warn!(row = i, "could not read label; row not counted");
                report.skipped += 1;
                continue;
            }
        };
        report.counted += 1;
        if predicted == actual {
            report.correct += 1;
        }
    }
    info!(
        correct = report.correct,
        counted = report.counted,
        accuracy = %format!("{:.2}%", report.accuracy_pct()),
        "evaluation finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::{ScalingEntry, ScalingTable};
    use std::collections::BTreeMap;

    fn model() -> Model {
        let mut weights = BTreeMap::new();
        weights.insert("AgeDif".to_string(), -1.0);
        let mut scaling = ScalingTable::new();
        scaling.insert("AgeDif", ScalingEntry { mean: 0.0, std_dev: 1.0 });
        Model::new(weights, 0.0, scaling)
    }

    fn row(label: Option<f64>, age: Option<f64>) -> LabeledRow {
        LabeledRow {
            label,
            features: age.map(|a| ("AgeDif".to_string(), a)).into_iter().collect(),
        }
    }

    #[test]
    fn counts_correct_predictions() {
        let rows = [
            row(Some(1.0), Some(-3.0)),
            row(Some(0.0), Some(4.0)),
            row(Some(0.0), Some(-1.0)),
        ];
        let r = evaluate(&model(), &rows);
        assert_eq!((r.correct, r.counted, r.skipped), (2, 3, 0));
        assert!((r.accuracy_pct() - 66.666_666).abs() < 1e-4);
    }

    #[test]
    fn unparseable_labels_shrink_the_denominator() {
        let rows = [row(Some(1.0), Some(-3.0)), row(None, Some(-3.0)), row(Some(0.5), None)];
        let r = evaluate(&model(), &rows);
        assert_eq!((r.correct, r.counted, r.skipped), (1, 1, 2));
        assert_eq!(r.accuracy_pct(), 100.0);
    }

    #[test]
    fn missing_feature_scores_as_bias_and_ties_go_red() {
        // z = 0 → p = 0.5 → red under the evaluation threshold.
        let r = evaluate(&model(), &[row(Some(1.0), None)]);
        assert_eq!(r.correct, 1);
    }

    #[test]
    fn nothing_counted_is_zero_accuracy() {
        assert_eq!(evaluate(&model(), &[]).accuracy_pct(), 0.0);
    }
}
