//! # Explanation
//! Ranks the difference-feature contributions of a scored matchup and turns
//! the strongest ones into sentences. A positive contribution favours the
//! red corner, a negative one the blue corner (differences are red − blue).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::is_difference_feature;
use crate::fighter::FighterRecord;
use crate::parse::stat_or;
use crate::scoring::Contribution;

/// How many factors make it into the rationale (headline + secondaries).
pub const TOP_FACTORS: usize = 3;

pub const NO_DOMINANT_FACTOR: &str =
    "The model could not identify a single dominant factor for this prediction.";

/// Feature name → phrase used in sentences.
const FEATURE_PHRASES: &[(&str, &str)] = &[
    ("HeightDif", "height"),
    ("ReachDif", "reach"),
    ("AgeDif", "age"),
    ("WinStreakDif", "win streak"),
    ("LossDif", "loss record"),
    ("SigStrDif", "significant strikes"),
    ("AvgTDDif", "takedowns"),
    ("TotalRoundDif", "experience"),
    ("TotalTitleBoutDif", "championship experience"),
    ("WeightDif", "weight"),
    ("RankDif", "fighter rank"),
    ("AvgSigStrPctDif", "striking accuracy"),
    ("AvgTDPctDif", "takedown accuracy"),
    ("AvgSubAttDif", "submission threat"),
    ("WinsDif", "win total"),
    ("OddsDif", "betting odds"),
];

/// Human-readable phrase; unknown names come back verbatim.
pub fn describe_feature(name: &str) -> &str {
    FEATURE_PHRASES
        .iter()
        .find(|(n, _)| *n == name)
        .map_or(name, |(_, phrase)| *phrase)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rationale {
    pub main_point: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl Rationale {
    pub fn no_dominant_factor() -> Self {
        Self {
            main_point: NO_DOMINANT_FACTOR.to_string(),
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ExplainError {
    #[error("contribution for '{feature}' is not a finite number")]
    NonFinite { feature: String },
}

/// Build the rationale for a scored matchup.
pub fn explain(
    contributions: &[Contribution],
    red: &FighterRecord,
    blue: &FighterRecord,
) -> Result<Rationale, ExplainError> {
    let mut ranked: Vec<&Contribution> = contributions
        .iter()
        .filter(|c| is_difference_feature(&c.feature))
        .collect();
    if let Some(bad) = ranked.iter().find(|c| !c.contribution.is_finite()) {
        return Err(ExplainError::NonFinite {
            feature: bad.feature.clone(),
        });
    }
    // Stable: equal magnitudes keep derivation order.
    ranked.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
    ranked.truncate(TOP_FACTORS);

    let Some((headline, secondary)) = ranked.split_first() else {
        return Ok(Rationale::no_dominant_factor());
    };

    let favoured = |c: &Contribution| {
        if c.contribution > 0.0 {
            red.name.as_str()
        } else {
            blue.name.as_str()
        }
    };

    let main_point = format!(
        "The model's prediction hinges on a significant {} advantage for {}.",
        describe_feature(&headline.feature),
        favoured(*headline)
    );

    let mut details = Vec::with_capacity(secondary.len() + 2);
    details.push(format!(
        "{} holds a record of {}, while {} is {}.",
        red.name,
        win_loss(red),
        blue.name,
        win_loss(blue)
    ));
    for c in secondary {
        details.push(format!(
            "A secondary factor was a {} advantage for {}.",
            describe_feature(&c.feature),
            favoured(*c)
        ));
    }
    if red.ranked_wins != blue.ranked_wins {
        details.push(format!(
            "In terms of schedule strength, {} has {} wins against ranked opponents compared to {} for {}.",
            red.name, red.ranked_wins, blue.ranked_wins, blue.name
        ));
    }

    Ok(Rationale {
        main_point,
        details,
    })
}

/// "12-3" from the raw tokens, truncated to integers.
fn win_loss(f: &FighterRecord) -> String {
    let wins = stat_or(&f.wins, 0.0) as i64;
    let losses = stat_or(&f.losses, 0.0) as i64;
    format!("{wins}-{losses}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(feature: &str, contribution: f64) -> Contribution {
        Contribution {
            feature: feature.to_string(),
            standardized: contribution,
            contribution,
        }
    }

    fn fighter(name: &str, wins: &str, losses: &str, ranked_wins: u32) -> FighterRecord {
        FighterRecord {
            name: name.into(),
            wins: wins.into(),
            losses: losses.into(),
            ranked_wins,
            ..FighterRecord::default()
        }
    }

    #[test]
    fn empty_contributions_mean_no_dominant_factor() {
        let r = explain(&[], &fighter("R", "1", "0", 0), &fighter("B", "1", "0", 3)).unwrap();
        assert_eq!(r, Rationale::no_dominant_factor());
        assert!(r.details.is_empty());
    }

    #[test]
    fn only_difference_features_are_ranked() {
        let cs = [c("RedOdds", 50.0), c("BlueStance_Orthodox", -9.0)];
        let r = explain(&cs, &fighter("R", "1", "0", 0), &fighter("B", "1", "0", 0)).unwrap();
        assert_eq!(r.main_point, NO_DOMINANT_FACTOR);
    }

    #[test]
    fn headline_secondaries_record_and_schedule() {
        let cs = [
            c("AgeDif", -0.4),
            c("ReachDif", 2.5),
            c("RedWins", 99.0),
            c("RankDif", -1.1),
            c("LossDif", 0.1),
        ];
        let red = fighter("Red Fighter", "20", "3.0", 4);
        let blue = fighter("Blue Fighter", "15.7", "bad", 1);
        let r = explain(&cs, &red, &blue).unwrap();
        assert_eq!(
            r.main_point,
            "The model's prediction hinges on a significant reach advantage for Red Fighter."
        );
        assert_eq!(
            r.details,
            vec![
                "Red Fighter holds a record of 20-3, while Blue Fighter is 15-0.".to_string(),
                "A secondary factor was a fighter rank advantage for Blue Fighter.".to_string(),
                "A secondary factor was a age advantage for Blue Fighter.".to_string(),
                "In terms of schedule strength, Red Fighter has 4 wins against ranked opponents compared to 1 for Blue Fighter.".to_string(),
            ]
        );
    }

    #[test]
    fn ties_keep_insertion_order_and_zero_favours_blue() {
        let cs = [c("HeightDif", 0.0), c("ReachDif", 0.0)];
        let r = explain(&cs, &fighter("R", "0", "0", 2), &fighter("B", "0", "0", 2)).unwrap();
        assert_eq!(
            r.main_point,
            "The model's prediction hinges on a significant height advantage for B."
        );
        assert_eq!(r.details.len(), 2);
        assert!(r.details[1].contains("reach advantage for B"));
    }

    #[test]
    fn unknown_feature_names_are_used_verbatim() {
        assert_eq!(describe_feature("MysteryDif"), "MysteryDif");
        assert_eq!(describe_feature("TotalTitleBoutDif"), "championship experience");
    }

    #[test]
    fn non_finite_contribution_is_an_error() {
        let cs = [c("AgeDif", f64::INFINITY)];
        let err = explain(&cs, &fighter("R", "0", "0", 0), &fighter("B", "0", "0", 0)).unwrap_err();
        assert_eq!(err, ExplainError::NonFinite { feature: "AgeDif".into() });
    }
}
