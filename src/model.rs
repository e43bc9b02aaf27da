//! # Trained model
//! `{weights, bias, scaling_params}` persisted as JSON. Produced by
//! [`crate::training`], read-only everywhere else.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

use crate::scaling::ScalingTable;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub weights: BTreeMap<String, f64>,
    pub bias: f64,
    #[serde(default)]
    pub scaling_params: ScalingTable,
}

impl Model {
    pub fn new(weights: BTreeMap<String, f64>, bias: f64, scaling_params: ScalingTable) -> Self {
        Self {
            weights,
            bias,
            scaling_params,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading model from {}", path.display()))?;
        let model: Model = serde_json::from_str(&data)
            .with_context(|| format!("parsing model JSON in {}", path.display()))?;
        Ok(model)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing model to {}", path.display()))?;
        Ok(())
    }

    pub fn weight(&self, feature: &str) -> Option<f64> {
        self.weights.get(feature).copied()
    }

    /// Names of every feature the model carries a weight for.
    pub fn trained_feature_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.weights.keys().map(String::as_str)
    }
}
