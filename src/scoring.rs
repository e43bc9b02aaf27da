//! # Linear scorer
//! Pure logic shared by training, evaluation, batch prediction and serving:
//! `z = bias + Σ weight·standardized(value)` over features that have both a
//! weight and a scaling entry, clipped to ±100, then passed through the
//! logistic function. No I/O, no state.
//!
//! Two winner thresholds: serving requires a strict red majority
//! (`p > 0.5`); evaluation and batch prediction use `p >= 0.5`. They
//! disagree at exactly 0.5.

use serde::Serialize;

use crate::features::FeatureVector;
use crate::fighter::Corner;
use crate::model::Model;

/// `z` is clipped to `[-Z_CLIP, Z_CLIP]` before `exp`.
pub const Z_CLIP: f64 = 100.0;
pub const DECISION_BOUNDARY: f64 = 0.5;

/// Which winner rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Live `/predict`: red needs `p > 0.5`.
    Serving,
    /// Training labels, evaluation and batch prediction: red on `p >= 0.5`.
    Evaluation,
}

impl Threshold {
    pub fn red_wins(self, probability_red: f64) -> bool {
        match self {
            Threshold::Serving => probability_red > DECISION_BOUNDARY,
            Threshold::Evaluation => probability_red >= DECISION_BOUNDARY,
        }
    }
}

/// One feature's share of `z`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: String,
    pub standardized: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Clipped logistic score.
    pub z: f64,
    pub probability_red: f64,
    /// In feature-vector order.
    pub contributions: Vec<Contribution>,
}

impl Score {
    pub fn winner(&self, threshold: Threshold) -> Corner {
        if threshold.red_wins(self.probability_red) {
            Corner::Red
        } else {
            Corner::Blue
        }
    }

    /// Probability assigned to the predicted winner.
    pub fn confidence(&self, threshold: Threshold) -> f64 {
        match self.winner(threshold) {
            Corner::Red => self.probability_red,
            Corner::Blue => 1.0 - self.probability_red,
        }
    }
}

pub fn clip_z(z: f64) -> f64 {
    z.clamp(-Z_CLIP, Z_CLIP)
}

/// Logistic of the clipped score.
pub fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-clip_z(z)).exp())
}

/// Score a feature vector. Features the model has no weight or no scaling
/// entry for are skipped; trained features missing from the vector add 0.
pub fn score(vector: &FeatureVector, model: &Model) -> Score {
    let mut z = model.bias;
    let mut contributions = Vec::new();

    for (name, value) in vector.iter() {
        let Some(weight) = model.weight(name) else {
            continue;
        };
        let Some(standardized) = model.scaling_params.standardize(name, value) else {
            continue;
        };
        let contribution = weight * standardized;
        z += contribution;
        contributions.push(Contribution {
            feature: name.to_string(),
            standardized,
            contribution,
        });
    }

    let z = clip_z(z);
    Score {
        z,
        probability_red: logistic(z),
        contributions,
    }
}

/// Confidence rendered the way the API reports it, e.g. `"73.42%"`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::{ScalingEntry, ScalingTable};
    use std::collections::BTreeMap;

    fn model(weights: &[(&str, f64)], bias: f64) -> Model {
        let mut scaling = ScalingTable::new();
        let mut w = BTreeMap::new();
        for (name, weight) in weights {
            w.insert(name.to_string(), *weight);
            scaling.insert(*name, ScalingEntry { mean: 0.0, std_dev: 1.0 });
        }
        Model::new(w, bias, scaling)
    }

    fn vector(pairs: &[(&str, f64)]) -> FeatureVector {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn empty_weights_leave_only_the_bias() {
        let m = model(&[], 0.7);
        let s = score(&vector(&[("AgeDif", 5.0), ("RedOdds", 120.0)]), &m);
        assert_eq!(s.z, 0.7);
        assert_eq!(s.probability_red, 1.0 / (1.0 + (-0.7f64).exp()));
        assert!(s.contributions.is_empty());
    }

    #[test]
    fn features_need_both_weight_and_scaling() {
        let mut m = model(&[("AgeDif", 2.0)], 0.0);
        m.weights.insert("ReachDif".into(), 10.0); // no scaling entry
        m.scaling_params.insert("HeightDif", ScalingEntry { mean: 1.0, std_dev: 2.0 }); // no weight
        let s = score(&vector(&[("AgeDif", 1.5), ("ReachDif", 4.0), ("HeightDif", 9.0)]), &m);
        assert_eq!(s.z, 3.0);
        assert_eq!(s.contributions.len(), 1);
        assert_eq!(s.contributions[0].feature, "AgeDif");
    }

    #[test]
    fn standardization_uses_stored_mean_and_std_dev() {
        let mut m = model(&[("AgeDif", 0.5)], 0.0);
        m.scaling_params.insert("AgeDif", ScalingEntry { mean: 2.0, std_dev: 4.0 });
        let s = score(&vector(&[("AgeDif", 10.0)]), &m);
        assert_eq!(s.contributions[0].standardized, 2.0);
        assert_eq!(s.contributions[0].contribution, 1.0);
    }

    #[test]
    fn clipping_saturates_at_100() {
        let huge = score(&vector(&[("AgeDif", 500.0)]), &model(&[("AgeDif", 1.0)], 0.0));
        let edge = score(&vector(&[("AgeDif", 100.0)]), &model(&[("AgeDif", 1.0)], 0.0));
        assert_eq!(huge.z, 100.0);
        assert_eq!(huge.z, edge.z);
        assert_eq!(huge.probability_red, edge.probability_red);

        let low = score(&vector(&[("AgeDif", -1e6)]), &model(&[("AgeDif", 1.0)], 0.0));
        assert_eq!(low.z, -100.0);
        assert!(low.probability_red > 0.0);
    }

    #[test]
    fn thresholds_disagree_exactly_at_one_half() {
        let s = score(&FeatureVector::new(), &model(&[], 0.0));
        assert_eq!(s.probability_red, 0.5);
        assert_eq!(s.winner(Threshold::Serving), Corner::Blue);
        assert_eq!(s.winner(Threshold::Evaluation), Corner::Red);
        assert_eq!(s.confidence(Threshold::Serving), 0.5);
    }

    #[test]
    fn confidence_follows_the_winner() {
        let s = score(&vector(&[("AgeDif", 5.0)]), &model(&[("AgeDif", -1.0)], 0.0));
        assert_eq!(s.z, -5.0);
        assert_eq!(s.winner(Threshold::Serving), Corner::Blue);
        assert!((s.confidence(Threshold::Serving) - 0.993_307).abs() < 1e-6);
        assert_eq!(format_confidence(s.confidence(Threshold::Serving)), "99.33%");
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let m = model(&[("AgeDif", 0.3), ("ReachDif", -0.7)], 0.05);
        let v = vector(&[("AgeDif", 2.0), ("ReachDif", 3.0)]);
        assert_eq!(score(&v, &m), score(&v, &m));
    }
}
