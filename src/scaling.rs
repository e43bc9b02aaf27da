//! # Standardization
//! Per-feature population mean / std-dev, fitted on the training rows and
//! stored with the model. A degenerate column (no spread) keeps std-dev 1.0,
//! which turns standardization into plain mean-centering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::features::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingEntry {
    pub mean: f64,
    pub std_dev: f64,
}

impl ScalingEntry {
    /// Population statistics over `values`; `None` for an empty slice.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        Some(Self {
            mean,
            std_dev: if std_dev == 0.0 { 1.0 } else { std_dev },
        })
    }

    pub fn standardize(&self, raw: f64) -> f64 {
        // Models read from disk may carry 0 or a non-finite std-dev.
        let sd = if self.std_dev.is_finite() && self.std_dev != 0.0 {
            self.std_dev
        } else {
            1.0
        };
        (raw - self.mean) / sd
    }
}

/// Feature name → scaling entry. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScalingTable(BTreeMap<String, ScalingEntry>);

impl ScalingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit one entry per feature over every row where that feature is present.
    /// Features with no values at all get no entry.
    pub fn fit<'f, 'r, I, R>(features: I, rows: R) -> Self
    where
        I: IntoIterator<Item = &'f str>,
        R: IntoIterator<Item = &'r FeatureVector> + Clone,
    {
        let mut table = Self::new();
        for feature in features {
            let values: Vec<f64> = rows
                .clone()
                .into_iter()
                .filter_map(|row| row.get(feature))
                .collect();
            if let Some(entry) = ScalingEntry::fit(&values) {
                table.0.insert(feature.to_string(), entry);
            }
        }
        table
    }

    pub fn insert(&mut self, feature: impl Into<String>, entry: ScalingEntry) {
        self.0.insert(feature.into(), entry);
    }

    pub fn get(&self, feature: &str) -> Option<&ScalingEntry> {
        self.0.get(feature)
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains_key(feature)
    }

    /// `None` when the feature has no entry: it is absent for scoring, not zero.
    pub fn standardize(&self, feature: &str, raw: f64) -> Option<f64> {
        self.get(feature).map(|e| e.standardize(raw))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
