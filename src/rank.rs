//! # Rank encoding
//! Weight-class rank tokens are either a number ("1".."15"), the champion
//! marker "C", or anything else (blank, "NR", garbage) meaning unranked.
//! Lower is better; the champion sits at 0.

use serde::{Deserialize, Serialize};

/// Token used in the fight data for the reigning champion.
pub const CHAMPION_TOKEN: &str = "C";
/// Rank assigned to unranked / unknown fighters (worst tier).
pub const DEFAULT_UNRANKED: f64 = 20.0;
/// Opponents at or above this rank count as "ranked" for schedule strength.
pub const DEFAULT_RANKED_THRESHOLD: f64 = 15.0;

/// Maps rank tokens onto a comparable numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankEncoder {
    pub unranked: f64,
}

impl Default for RankEncoder {
    fn default() -> Self {
        Self {
            unranked: DEFAULT_UNRANKED,
        }
    }
}

impl RankEncoder {
    pub fn new(unranked: f64) -> Self {
        Self { unranked }
    }

    /// Never fails: anything that is neither "C" nor a number is unranked.
    pub fn encode(&self, token: &str) -> f64 {
        if token == CHAMPION_TOKEN {
            return 0.0;
        }
        crate::parse::parse_stat(token).unwrap_or(self.unranked)
    }

    /// Missing column / field is treated like an empty token.
    pub fn encode_opt(&self, token: Option<&str>) -> f64 {
        token.map_or(self.unranked, |t| self.encode(t))
    }
}

/// Encode with the default unranked sentinel.
pub fn encode_rank(token: &str) -> f64 {
    RankEncoder::default().encode(token)
}
