//! Errors surfaced to `/predict` callers. Malformed individual stats never
//! end up here; they are defaulted where they are parsed.

use thiserror::Error;

use crate::explain::ExplainError;
use crate::features::FeatureError;

/// Coarse failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Model / fighter lookup did not resolve.
    MissingData,
    /// Something broke while building features or the explanation.
    UnexpectedComputation,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Model or fighter data not loaded.")]
    NotLoaded,
    #[error("One or both fighters not found.")]
    FighterNotFound { red: String, blue: String },
    #[error("Could not create feature for prediction. Error: {0}")]
    FeatureConstruction(String),
    #[error("Prediction calculation failed. Error: {0}")]
    Scoring(String),
    #[error("Explanation generation failed. Error: {0}")]
    Explanation(String),
}

impl PredictError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PredictError::NotLoaded | PredictError::FighterNotFound { .. } => {
                ErrorCategory::MissingData
            }
            PredictError::FeatureConstruction(_)
            | PredictError::Scoring(_)
            | PredictError::Explanation(_) => {
                ErrorCategory::UnexpectedComputation
            }
        }
    }

    /// Short label for metrics / logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::NotLoaded => "not_loaded",
            PredictError::FighterNotFound { .. } => "fighter_not_found",
            PredictError::FeatureConstruction(_) => "feature_construction",
            PredictError::Scoring(_) => "scoring",
            PredictError::Explanation(_) => "explanation",
        }
    }
}

impl From<FeatureError> for PredictError {
    fn from(e: FeatureError) -> Self {
        PredictError::FeatureConstruction(e.to_string())
    }
}

impl From<ExplainError> for PredictError {
    fn from(e: ExplainError) -> Self {
        PredictError::Explanation(e.to_string())
    }
}
