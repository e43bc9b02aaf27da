//! # Training
//! Plain batch gradient descent on the logistic loss. Scoring goes through
//! [`crate::scoring::score`], so standardization, skipping and clipping are
//! exactly what serving does.

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::TrainConfig;
use crate::dataset::{LabeledData, LabeledRow};
use crate::model::Model;
use crate::scaling::ScalingTable;
use crate::scoring::score;

pub fn train(data: &LabeledData, cfg: &TrainConfig) -> Result<Model> {
    let labeled: Vec<(&LabeledRow, f64)> = data
        .rows
        .iter()
        .filter_map(|r| r.label.map(|l| (r, l)))
        .collect();
    let skipped = data.rows.len() - labeled.len();
    if skipped > 0 {
        warn!(skipped, "training rows with unparseable label ignored");
    }
    if labeled.is_empty() {
        bail!("training data is empty");
    }

    let scaling = ScalingTable::fit(
        data.features.iter().map(String::as_str),
        data.rows.iter().map(|r| &r.features),
    );
    let weights: BTreeMap<String, f64> = data.features.iter().map(|f| (f.clone(), 0.0)).collect();
    let mut model = Model::new(weights, 0.0, scaling);

    let n = labeled.len() as f64;
    for iteration in 0..cfg.iterations {
        let mut d_weights: BTreeMap<&str, f64> =
            data.features.iter().map(|f| (f.as_str(), 0.0)).collect();
        let mut d_bias = 0.0;

        for (row, label) in &labeled {
            let s = score(&row.features, &model);
            let error = s.probability_red - label;
            d_bias += error;
            for c in &s.contributions {
                if let Some(d) = d_weights.get_mut(c.feature.as_str()) {
                    *d += error * c.standardized;
                }
            }
        }

        model.bias -= cfg.learning_rate * (d_bias / n);
        for (name, d) in d_weights {
            if let Some(w) = model.weights.get_mut(name) {
                *w -= cfg.learning_rate * (d / n);
            }
        }

        if iteration % 100 == 0 {
            debug!(iteration, loss = log_loss(&labeled, &model), "training progress");
        }
    }

    info!(
        rows = labeled.len(),
        features = model.weights.len(),
        iterations = cfg.iterations,
        loss = log_loss(&labeled, &model),
        "model training complete"
    );
    Ok(model)
}

/// Mean binary cross-entropy.
pub fn log_loss(rows: &[(&LabeledRow, f64)], model: &Model) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let eps = 1e-12;
    let total: f64 = rows
        .iter()
        .map(|(row, label)| {
            let p = score(&row.features, model).probability_red.clamp(eps, 1.0 - eps);
            -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
        })
        .sum();
    total / rows.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;
    use crate::scoring::Threshold;

    fn row(label: Option<f64>, pairs: &[(&str, f64)]) -> LabeledRow {
        LabeledRow {
            label,
            features: pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }

    fn separable() -> LabeledData {
        let mut rows = Vec::new();
        for i in 0..20 {
            let age = f64::from(i) - 10.0;
            // Older red fighter loses.
            rows.push(row(Some(if age < 0.0 { 1.0 } else { 0.0 }), &[("AgeDif", age), ("Noise", 1.0)]));
        }
        LabeledData {
            features: vec!["AgeDif".into(), "Noise".into(), "Empty".into()],
            rows,
        }
    }

    #[test]
    fn learns_the_sign_of_a_separable_feature() {
        let cfg = TrainConfig {
            learning_rate: 0.5,
            iterations: 200,
        };
        let model = train(&separable(), &cfg).unwrap();
        assert!(model.weight("AgeDif").unwrap() < 0.0);
        // Constant column: mean-centred to zero, so its weight never moves.
        assert_eq!(model.weight("Noise"), Some(0.0));
        // No values at all: weight exists, scaling does not.
        assert_eq!(model.weight("Empty"), Some(0.0));
        assert!(!model.scaling_params.contains("Empty"));

        let young_red: FeatureVector = [("AgeDif".to_string(), -6.0)].into_iter().collect();
        assert_eq!(score(&young_red, &model).winner(Threshold::Evaluation), crate::fighter::Corner::Red);
    }

    #[test]
    fn loss_decreases_with_training() {
        let data = separable();
        let labeled: Vec<(&LabeledRow, f64)> =
            data.rows.iter().map(|r| (r, r.label.unwrap())).collect();
        let short = train(&data, &TrainConfig { learning_rate: 0.1, iterations: 1 }).unwrap();
        let long = train(&data, &TrainConfig { learning_rate: 0.1, iterations: 100 }).unwrap();
        assert!(log_loss(&labeled, &long) < log_loss(&labeled, &short));
    }

    #[test]
    fn empty_or_unlabeled_data_is_rejected() {
        let cfg = TrainConfig::default();
        assert!(train(&LabeledData::default(), &cfg).is_err());
        let unlabeled = LabeledData {
            features: vec!["AgeDif".into()],
            rows: vec![row(None, &[("AgeDif", 1.0)])],
        };
        assert!(train(&unlabeled, &cfg).is_err());
    }
}
