//! # Feature engineering
//! Turns a matchup into the named feature vector the model was trained on.
//!
//! The feature list is a set of typed descriptors built once (from the fixed
//! difference/corner tables plus the stance indicators found in the trained
//! weight names), so per-request derivation is a walk over descriptors, not
//! string parsing. The same descriptors serve both sources:
//! - [`Matchup`]: two fighter snapshots (serving),
//! - [`FightRow`]: one historical / upcoming fight row (training, batch).
//!
//! Sign convention: every difference feature is red minus blue.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::fighter::{Corner, FightRow, FighterRecord, StatAttribute};
use crate::parse::{opt_stat_or, stat_or};
use crate::rank::RankEncoder;

/// Name of the rank difference feature.
pub const RANK_DIFFERENCE: &str = "RankDif";
/// Difference features are recognised by this marker in their name.
pub const DIFFERENCE_MARKER: &str = "Dif";

/// One red-minus-blue feature over a numeric attribute.
#[derive(Debug, Clone, Copy)]
pub struct DifferenceFeature {
    pub name: &'static str,
    pub attribute: StatAttribute,
    /// Fight rows may carry this feature already differenced under `name`.
    pub precomputed: bool,
}

const fn dif(name: &'static str, attribute: StatAttribute, precomputed: bool) -> DifferenceFeature {
    DifferenceFeature {
        name,
        attribute,
        precomputed,
    }
}

pub const DIFFERENCE_FEATURES: &[DifferenceFeature] = &[
    dif("HeightDif", StatAttribute::Height, true),
    dif("ReachDif", StatAttribute::Reach, true),
    dif("AgeDif", StatAttribute::Age, true),
    dif("WinStreakDif", StatAttribute::WinStreak, true),
    dif("LossDif", StatAttribute::Losses, false),
    dif("SigStrDif", StatAttribute::SigStrLanded, false),
    dif("AvgTDDif", StatAttribute::TdLanded, false),
    dif("TotalRoundDif", StatAttribute::TotalRounds, true),
    dif("TotalTitleBoutDif", StatAttribute::TitleBouts, true),
    dif("WeightDif", StatAttribute::Weight, false),
    dif("AvgSigStrPctDif", StatAttribute::SigStrPct, false),
    dif("AvgTDPctDif", StatAttribute::TdPct, false),
    dif("AvgSubAttDif", StatAttribute::SubAtt, false),
    dif("WinsDif", StatAttribute::Wins, false),
    dif("OddsDif", StatAttribute::Odds, false),
];

/// Raw stats emitted once per corner as `Red<column>` / `Blue<column>`.
pub const CORNER_FEATURES: &[StatAttribute] = &[
    StatAttribute::SigStrLanded,
    StatAttribute::SigStrPct,
    StatAttribute::TdLanded,
    StatAttribute::TdPct,
    StatAttribute::SubAtt,
    StatAttribute::Wins,
    StatAttribute::Losses,
    StatAttribute::Odds,
];

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("feature '{feature}' evaluated to a non-finite value")]
    NonFinite { feature: String },
}

/// How a single feature is derived.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Difference {
        attribute: StatAttribute,
        precomputed: bool,
    },
    RankDifference,
    Corner {
        corner: Corner,
        attribute: StatAttribute,
    },
    Stance {
        corner: Corner,
        stance: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDescriptor {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureDescriptor {
    pub fn is_difference(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Difference { .. } | FeatureKind::RankDifference
        )
    }
}

/// `RedStance_Orthodox` etc.
pub fn stance_feature_name(corner: Corner, stance: &str) -> String {
    format!("{}Stance_{}", corner.prefix(), stance)
}

/// Inverse of [`stance_feature_name`].
pub fn parse_stance_feature(name: &str) -> Option<(Corner, &str)> {
    Corner::BOTH.into_iter().find_map(|corner| {
        name.strip_prefix(corner.prefix())
            .and_then(|rest| rest.strip_prefix("Stance_"))
            .map(|stance| (corner, stance))
    })
}

/// True for red-minus-blue feature names.
pub fn is_difference_feature(name: &str) -> bool {
    name.contains(DIFFERENCE_MARKER)
}

/// Where feature inputs come from. Raw tokens only; parsing and defaults
/// are applied by [`FeatureSet::build`].
pub trait FeatureSource {
    fn stat(&self, corner: Corner, attr: StatAttribute) -> Option<&str>;
    fn rank(&self, corner: Corner) -> Option<&str>;
    fn stance(&self, corner: Corner) -> Option<&str>;

    /// Already-differenced value for `feature`, when the source carries one.
    fn precomputed(&self, _feature: &str) -> Option<&str> {
        None
    }
}

/// Serving-time source: two fighter snapshots.
#[derive(Debug, Clone, Copy)]
pub struct Matchup<'a> {
    pub red: &'a FighterRecord,
    pub blue: &'a FighterRecord,
}

impl<'a> Matchup<'a> {
    pub fn new(red: &'a FighterRecord, blue: &'a FighterRecord) -> Self {
        Self { red, blue }
    }

    fn side(&self, corner: Corner) -> &'a FighterRecord {
        match corner {
            Corner::Red => self.red,
            Corner::Blue => self.blue,
        }
    }
}

impl FeatureSource for Matchup<'_> {
    fn stat(&self, corner: Corner, attr: StatAttribute) -> Option<&str> {
        Some(self.side(corner).stat(attr))
    }

    fn rank(&self, corner: Corner) -> Option<&str> {
        Some(self.side(corner).rank.as_str())
    }

    fn stance(&self, corner: Corner) -> Option<&str> {
        Some(self.side(corner).stance.as_str())
    }
}

/// Training / batch source: a single fight row.
impl FeatureSource for FightRow {
    fn stat(&self, corner: Corner, attr: StatAttribute) -> Option<&str> {
        self.get(&attr.corner_column(corner))
    }

    fn rank(&self, corner: Corner) -> Option<&str> {
        self.get(corner.rank_column())
    }

    fn stance(&self, corner: Corner) -> Option<&str> {
        self.get(&format!("{}Stance", corner.prefix()))
    }

    fn precomputed(&self, feature: &str) -> Option<&str> {
        self.get(feature)
    }
}

/// Ordered feature name → value mapping. Order is derivation order, which
/// the explanation relies on for stable tie-breaking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an overwritten entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut v = FeatureVector::new();
        for (name, value) in iter {
            v.insert(name, value);
        }
        v
    }
}

/// The ordered list of feature descriptors a model understands.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    descriptors: Vec<FeatureDescriptor>,
    ranks: RankEncoder,
}

impl FeatureSet {
    /// Differences, rank difference and per-corner raw stats. No stances.
    pub fn base(ranks: RankEncoder) -> Self {
        let mut descriptors = Vec::with_capacity(DIFFERENCE_FEATURES.len() + 1 + 2 * CORNER_FEATURES.len());
        for d in DIFFERENCE_FEATURES {
            descriptors.push(FeatureDescriptor {
                name: d.name.to_string(),
                kind: FeatureKind::Difference {
                    attribute: d.attribute,
                    precomputed: d.precomputed,
                },
            });
        }
        descriptors.push(FeatureDescriptor {
            name: RANK_DIFFERENCE.to_string(),
            kind: FeatureKind::RankDifference,
        });
        for &attribute in CORNER_FEATURES {
            for corner in Corner::BOTH {
                descriptors.push(FeatureDescriptor {
                    name: attribute.corner_column(corner),
                    kind: FeatureKind::Corner { corner, attribute },
                });
            }
        }
        Self { descriptors, ranks }
    }

    /// The descriptors a trained model has weights for: base features whose
    /// name is trained, then the trained `RedStance_*` / `BlueStance_*`
    /// indicators. Every built name is one of `trained_names`.
    pub fn for_trained<'a, I>(trained_names: I, ranks: RankEncoder) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let trained: BTreeSet<&str> = trained_names.into_iter().collect();
        let mut set = Self::base(ranks);
        set.descriptors.retain(|d| trained.contains(d.name.as_str()));
        for name in &trained {
            if let Some((corner, stance)) = parse_stance_feature(name) {
                set.push_stance(corner, stance);
            }
        }
        set
    }

    /// Base features plus a red and blue indicator for every stance given.
    pub fn with_stances<I, S>(stances: I, ranks: RankEncoder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::base(ranks);
        let stances: Vec<S> = stances.into_iter().collect();
        for corner in Corner::BOTH {
            for s in &stances {
                set.push_stance(corner, s.as_ref());
            }
        }
        set
    }

    fn push_stance(&mut self, corner: Corner, stance: &str) {
        self.descriptors.push(FeatureDescriptor {
            name: stance_feature_name(corner, stance),
            kind: FeatureKind::Stance {
                corner,
                stance: stance.to_string(),
            },
        });
    }

    pub fn descriptors(&self) -> &[FeatureDescriptor] {
        &self.descriptors
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn rank_encoder(&self) -> &RankEncoder {
        &self.ranks
    }

    /// Derive every feature. Malformed individual tokens fall back to their
    /// defaults; only a non-finite result is an error.
    pub fn build(&self, source: &impl FeatureSource) -> Result<FeatureVector, FeatureError> {
        let mut out = FeatureVector {
            entries: Vec::with_capacity(self.descriptors.len()),
        };
        for d in &self.descriptors {
            let value = self.derive(d, source);
            if !value.is_finite() {
                return Err(FeatureError::NonFinite {
                    feature: d.name.clone(),
                });
            }
            out.entries.push((d.name.clone(), value));
        }
        Ok(out)
    }

    fn derive(&self, d: &FeatureDescriptor, source: &impl FeatureSource) -> f64 {
        match &d.kind {
            FeatureKind::Difference {
                attribute,
                precomputed,
            } => {
                if *precomputed {
                    if let Some(token) = source.precomputed(&d.name) {
                        return stat_or(token, 0.0);
                    }
                }
                opt_stat_or(source.stat(Corner::Red, *attribute), 0.0)
                    - opt_stat_or(source.stat(Corner::Blue, *attribute), 0.0)
            }
            FeatureKind::RankDifference => {
                self.ranks.encode_opt(source.rank(Corner::Red))
                    - self.ranks.encode_opt(source.rank(Corner::Blue))
            }
            FeatureKind::Corner { corner, attribute } => {
                opt_stat_or(source.stat(*corner, *attribute), 0.0)
            }
            FeatureKind::Stance { corner, stance } => {
                let actual = source.stance(*corner).map(str::trim);
                if actual == Some(stance.as_str()) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Every distinct non-empty stance in the fight rows, sorted.
pub fn stance_vocabulary(rows: &[FightRow]) -> BTreeSet<String> {
    rows.iter()
        .flat_map(|row| Corner::BOTH.map(|c| row.stance(c)))
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
