//! # Prediction
//! The serving entry point. A [`PredictionContext`] is built once at startup
//! (model + fighter snapshots + feature descriptors) and shared read-only by
//! every request.
//!
//! Stages per request: lookup → features → score → explanation. Feature and
//! explanation failures come back as [`PredictError`] values, never panics.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PredictorConfig;
use crate::dataset::read_table;
use crate::error::PredictError;
use crate::explain::{explain, Rationale};
use crate::features::{FeatureSet, Matchup};
use crate::fighter::{Corner, FightRow, FighterIndex, WeightClassIndex};
use crate::model::Model;
use crate::rank::RankEncoder;
use crate::scoring::{format_confidence, score, Threshold};

/// Everything a prediction needs, loaded once.
#[derive(Debug, Clone)]
pub struct PredictionContext {
    model: Option<Model>,
    fighters: FighterIndex,
    weight_classes: WeightClassIndex,
    features: FeatureSet,
}

impl PredictionContext {
    pub fn new(model: Option<Model>, fighters: FighterIndex, ranks: RankEncoder) -> Self {
        let features = match &model {
            Some(m) => FeatureSet::for_trained(m.trained_feature_names(), ranks),
            None => FeatureSet::base(ranks),
        };
        let weight_classes = WeightClassIndex::from_fighters(&fighters);
        Self {
            model,
            fighters,
            weight_classes,
            features,
        }
    }

    /// Nothing loaded; every prediction reports `NotLoaded`.
    pub fn empty() -> Self {
        Self::new(None, FighterIndex::default(), RankEncoder::default())
    }

    /// Load the model JSON and fight history named by the config.
    pub fn load(cfg: &PredictorConfig) -> Result<Self> {
        let model = Model::load_from_file(&cfg.model_path)?;
        let fights = read_table(&cfg.fights_path)
            .with_context(|| format!("loading fight history from {}", cfg.fights_path.display()))?;
        let ranks = cfg.rank_encoder();
        let fighters = FighterIndex::from_fights(&fights.rows, &ranks, cfg.ranked_win_threshold);
        info!(
            fighters = fighters.len(),
            weights = model.weights.len(),
            "model and fighter data loaded"
        );
        Ok(Self::new(Some(model), fighters, ranks))
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn fighters(&self) -> &FighterIndex {
        &self.fighters
    }

    pub fn weight_classes(&self) -> &WeightClassIndex {
        &self.weight_classes
    }

    pub fn feature_set(&self) -> &FeatureSet {
        &self.features
    }

    /// Predict `red` vs `blue` (names as given; callers trim).
    pub fn predict(&self, red: &str, blue: &str) -> Result<PredictionResult, PredictError> {
        debug!(%red, %blue, "prediction request");
        let model = match &self.model {
            Some(m) if !self.fighters.is_empty() => m,
            _ => {
                debug!("model or stats not loaded");
                return Err(PredictError::NotLoaded);
            }
        };

        let (Some(red_rec), Some(blue_rec)) = (self.fighters.get(red), self.fighters.get(blue)) else {
            debug!(%red, %blue, "fighter stats not found");
            return Err(PredictError::FighterNotFound {
                red: red.to_string(),
                blue: blue.to_string(),
            });
        };

        let vector = self.features.build(&Matchup::new(red_rec, blue_rec)).map_err(|e| {
            warn!(error = %e, "feature engineering failed");
            PredictError::from(e)
        })?;
        debug!(features = vector.len(), "feature engineering successful");

        let scored = score(&vector, model);
        if !scored.z.is_finite() {
            warn!(z = scored.z, "prediction score is not finite");
            return Err(PredictError::Scoring(format!("score evaluated to {}", scored.z)));
        }
        let winner_corner = scored.winner(Threshold::Serving);
        let confidence = scored.confidence(Threshold::Serving);
        debug!(z = scored.z, p_red = scored.probability_red, "prediction calculation successful");

        let rationale = explain(&scored.contributions, red_rec, blue_rec).map_err(|e| {
            warn!(error = %e, "explanation generation failed");
            PredictError::from(e)
        })?;
        debug!(details = rationale.details.len(), "explanation generation successful");

        let winner = match winner_corner {
            Corner::Red => red_rec.name.clone(),
            Corner::Blue => blue_rec.name.clone(),
        };
        info!(%red, %blue, %winner, confidence = %format_confidence(confidence), "prediction");

        Ok(PredictionResult {
            winner,
            winner_corner,
            probability_red: scored.probability_red,
            confidence,
            rationale,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub winner: String,
    pub winner_corner: Corner,
    pub probability_red: f64,
    /// In (0, 1): probability of the predicted winner.
    pub confidence: f64,
    pub rationale: Rationale,
}

impl PredictionResult {
    pub fn confidence_pct(&self) -> String {
        format_confidence(self.confidence)
    }
}

/// Wire shape of `/predict`: the prediction, or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Prediction {
        #[serde(rename = "PredictedWinner")]
        predicted_winner: String,
        #[serde(rename = "Confidence")]
        confidence: String,
        explanation: Rationale,
    },
    Error {
        error: String,
    },
}

impl From<Result<PredictionResult, PredictError>> for PredictionResponse {
    fn from(r: Result<PredictionResult, PredictError>) -> Self {
        match r {
            Ok(p) => PredictionResponse::Prediction {
                confidence: p.confidence_pct(),
                predicted_winner: p.winner,
                explanation: p.rationale,
            },
            Err(e) => PredictionResponse::Error {
                error: e.to_string(),
            },
        }
    }
}

/// One line of the upcoming-card output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingPrediction {
    #[serde(rename = "RedFighter")]
    pub red_fighter: String,
    #[serde(rename = "BlueFighter")]
    pub blue_fighter: String,
    #[serde(rename = "PredictedWinner")]
    pub predicted_winner: String,
    #[serde(rename = "Confidence")]
    pub confidence: String,
}

/// Score a card of upcoming bouts given as fight rows (same column shape as
/// the training data). Uses the non-strict threshold. Rows whose features
/// cannot be built are skipped.
pub fn predict_upcoming(rows: &[FightRow], model: &Model, ranks: RankEncoder) -> Vec<UpcomingPrediction> {
    let set = FeatureSet::for_trained(model.trained_feature_names(), ranks);
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let red = row.fighter_name(Corner::Red);
        let blue = row.fighter_name(Corner::Blue);
        let vector = match set.build(row) {
            Ok(v) => v,
            Err(e) => {
                warn!(%red, %blue, error = %e, "skipping upcoming bout");
                continue;
            }
        };
        let s = score(&vector, model);
        if !s.z.is_finite() {
            warn!(%red, %blue, z = s.z, "skipping upcoming bout with non-finite score");
            continue;
        }
        let winner = match s.winner(Threshold::Evaluation) {
            Corner::Red => red,
            Corner::Blue => blue,
        };
        out.push(UpcomingPrediction {
            red_fighter: red.to_string(),
            blue_fighter: blue.to_string(),
            predicted_winner: winner.to_string(),
            confidence: format_confidence(s.confidence(Threshold::Evaluation)),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::fighter::FighterRecord;
    use crate::scaling::{ScalingEntry, ScalingTable};
    use std::collections::BTreeMap;

    fn fighter(name: &str, age: &str) -> FighterRecord {
        FighterRecord {
            name: name.into(),
            age: age.into(),
            wins: "10".into(),
            losses: "2".into(),
            ..FighterRecord::default()
        }
    }

    fn age_model() -> Model {
        let mut weights = BTreeMap::new();
        weights.insert("AgeDif".to_string(), -1.0);
        let mut scaling = ScalingTable::new();
        scaling.insert("AgeDif", ScalingEntry { mean: 0.0, std_dev: 1.0 });
        Model::new(weights, 0.0, scaling)
    }

    fn ctx(model: Option<Model>) -> PredictionContext {
        let mut idx = FighterIndex::default();
        idx.insert(fighter("Veteran", "30"));
        idx.insert(fighter("Prospect", "25"));
        PredictionContext::new(model, idx, RankEncoder::default())
    }

    #[test]
    fn younger_blue_fighter_wins_on_age() {
        let p = ctx(Some(age_model())).predict("Veteran", "Prospect").unwrap();
        assert_eq!(p.winner, "Prospect");
        assert_eq!(p.winner_corner, Corner::Blue);
        assert!((p.probability_red - 0.006_692_85).abs() < 1e-6);
        assert_eq!(p.confidence_pct(), "99.33%");
        assert_eq!(
            p.rationale.main_point,
            "The model's prediction hinges on a significant age advantage for Prospect."
        );
        assert_eq!(
            p.rationale.details[0],
            "Veteran holds a record of 10-2, while Prospect is 10-2."
        );
    }

    #[test]
    fn dead_even_matchup_goes_to_blue_when_serving() {
        let mut weights = BTreeMap::new();
        let mut scaling = ScalingTable::new();
        for name in ["AgeDif", "HeightDif"] {
            weights.insert(name.to_string(), 0.0);
            scaling.insert(name, ScalingEntry { mean: 0.0, std_dev: 1.0 });
        }
        let mut idx = FighterIndex::default();
        idx.insert(fighter("Twin A", "28"));
        idx.insert(fighter("Twin B", "28"));
        let c = PredictionContext::new(Some(Model::new(weights, 0.0, scaling)), idx, RankEncoder::default());

        let p = c.predict("Twin A", "Twin B").unwrap();
        assert_eq!(p.probability_red, 0.5);
        assert_eq!(p.winner, "Twin B");
        assert_eq!(p.confidence_pct(), "50.00%");
    }

    #[test]
    fn unknown_fighter_is_missing_data_regardless_of_model() {
        for model in [Some(age_model()), Some(Model::default())] {
            let err = ctx(model).predict("Veteran", "Nobody").unwrap_err();
            assert!(matches!(err, PredictError::FighterNotFound { .. }));
            assert_eq!(err.category(), ErrorCategory::MissingData);
        }
    }

    #[test]
    fn nothing_loaded_is_reported() {
        assert_eq!(ctx(None).predict("Veteran", "Prospect").unwrap_err(), PredictError::NotLoaded);
        assert_eq!(
            PredictionContext::empty().predict("A", "B").unwrap_err(),
            PredictError::NotLoaded
        );
        assert_eq!(ctx(None).predict("Veteran", "Nobody").unwrap_err().category(), ErrorCategory::MissingData);
    }

    #[test]
    fn overflowing_stats_become_a_feature_error() {
        let mut idx = FighterIndex::default();
        let mut a = fighter("A", "30");
        a.weight = "1e308".into();
        let mut b = fighter("B", "30");
        b.weight = "-1e308".into();
        idx.insert(a);
        idx.insert(b);
        let mut model = age_model();
        model.weights.insert("WeightDif".to_string(), 0.1);
        let c = PredictionContext::new(Some(model), idx, RankEncoder::default());
        let err = c.predict("A", "B").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnexpectedComputation);
        assert!(err.to_string().starts_with("Could not create feature for prediction."));
    }

    #[test]
    fn opposing_infinite_contributions_are_a_scoring_error() {
        let mut idx = FighterIndex::default();
        for name in ["A", "B"] {
            let mut f = fighter(name, "30");
            f.odds = "1e10".into();
            idx.insert(f);
        }
        let mut weights = BTreeMap::new();
        weights.insert("RedOdds".to_string(), 1e308);
        weights.insert("BlueOdds".to_string(), -1e308);
        let mut scaling = ScalingTable::new();
        for name in ["RedOdds", "BlueOdds"] {
            scaling.insert(name, ScalingEntry { mean: 0.0, std_dev: 1.0 });
        }
        let c = PredictionContext::new(Some(Model::new(weights, 0.0, scaling)), idx, RankEncoder::default());

        let err = c.predict("A", "B").unwrap_err();
        assert!(matches!(err, PredictError::Scoring(_)));
        assert_eq!(err.category(), ErrorCategory::UnexpectedComputation);
        let wire = serde_json::to_value(PredictionResponse::from(Err(err))).unwrap();
        assert!(wire["error"]
            .as_str()
            .unwrap()
            .starts_with("Prediction calculation failed."));
    }

    #[test]
    fn response_wire_shape() {
        let ok = PredictionResponse::from(ctx(Some(age_model())).predict("Veteran", "Prospect"));
        let v = serde_json::to_value(&ok).unwrap();
        assert_eq!(v["PredictedWinner"], "Prospect");
        assert_eq!(v["Confidence"], "99.33%");
        assert!(v["explanation"]["main_point"].is_string());
        assert!(v["explanation"]["details"].is_array());

        let err = PredictionResponse::from(ctx(None).predict("a", "b"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"error": "Model or fighter data not loaded."})
        );
    }

    #[test]
    fn upcoming_card_uses_row_columns_and_non_strict_threshold() {
        let rows = vec![
            FightRow::from_pairs([("RedFighter", "Old"), ("BlueFighter", "Young"), ("AgeDif", "6")]),
            FightRow::from_pairs([("RedFighter", "Even"), ("BlueFighter", "Steven"), ("AgeDif", "0")]),
        ];
        let out = predict_upcoming(&rows, &age_model(), RankEncoder::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].predicted_winner, "Young");
        assert_eq!(out[1].predicted_winner, "Even");
        assert_eq!(out[1].confidence, "50.00%");
    }
}
