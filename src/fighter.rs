//! # Fighter snapshots
//! A fighter's record is taken from the first fight row the fighter appears
//! in (the fight data is ordered newest first), plus a count of wins over
//! ranked opponents computed once at load time. Records are read-only after
//! the index is built.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::rank::RankEncoder;

/// One side of a matchup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    Red,
    Blue,
}

impl Corner {
    pub const BOTH: [Corner; 2] = [Corner::Red, Corner::Blue];

    /// Column / feature-name prefix ("Red", "Blue").
    pub fn prefix(self) -> &'static str {
        match self {
            Corner::Red => "Red",
            Corner::Blue => "Blue",
        }
    }

    /// The fight data abbreviates the rank columns.
    pub fn rank_column(self) -> &'static str {
        match self {
            Corner::Red => "RMatchWCRank",
            Corner::Blue => "BMatchWCRank",
        }
    }

    pub fn opponent(self) -> Corner {
        match self {
            Corner::Red => Corner::Blue,
            Corner::Blue => Corner::Red,
        }
    }
}

/// Numeric career stats carried per fighter. `column()` is the per-corner
/// column suffix in the fight data (`Red<column>` / `Blue<column>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatAttribute {
    Height,
    Reach,
    Age,
    WinStreak,
    Losses,
    Wins,
    SigStrLanded,
    SigStrPct,
    TdLanded,
    TdPct,
    SubAtt,
    TotalRounds,
    TitleBouts,
    Odds,
    Weight,
}

impl StatAttribute {
    pub fn column(self) -> &'static str {
        match self {
            StatAttribute::Height => "HeightCms",
            StatAttribute::Reach => "ReachCms",
            StatAttribute::Age => "Age",
            StatAttribute::WinStreak => "CurrentWinStreak",
            StatAttribute::Losses => "Losses",
            StatAttribute::Wins => "Wins",
            StatAttribute::SigStrLanded => "AvgSigStrLanded",
            StatAttribute::SigStrPct => "AvgSigStrPct",
            StatAttribute::TdLanded => "AvgTDLanded",
            StatAttribute::TdPct => "AvgTDPct",
            StatAttribute::SubAtt => "AvgSubAtt",
            StatAttribute::TotalRounds => "TotalRoundsFought",
            StatAttribute::TitleBouts => "TotalTitleBouts",
            StatAttribute::Odds => "Odds",
            StatAttribute::Weight => "WeightLbs",
        }
    }

    /// Full column name for one corner, e.g. `RedHeightCms`.
    pub fn corner_column(self, corner: Corner) -> String {
        format!("{}{}", corner.prefix(), self.column())
    }
}

/// One CSV record keyed by header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FightRow {
    fields: HashMap<String, String>,
}

impl FightRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Winning corner, if the `Winner` column names one.
    pub fn winner(&self) -> Option<Corner> {
        match self.get("Winner").map(str::trim) {
            Some("Red") => Some(Corner::Red),
            Some("Blue") => Some(Corner::Blue),
            _ => None,
        }
    }

    /// Trimmed fighter name for a corner (empty when absent).
    pub fn fighter_name(&self, corner: Corner) -> &str {
        self.get(&format!("{}Fighter", corner.prefix()))
            .unwrap_or_default()
            .trim()
    }
}

/// Snapshot of one fighter's career stats. Numeric stats stay as the raw
/// tokens from the data; they are parsed (with defaults) at feature time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterRecord {
    pub name: String,
    pub weight_class: String,
    /// Weight-class rank token: number, "C" or blank.
    pub rank: String,
    pub stance: String,
    pub height: String,
    pub reach: String,
    pub age: String,
    pub win_streak: String,
    pub losses: String,
    pub wins: String,
    pub sig_str_landed: String,
    pub sig_str_pct: String,
    pub td_landed: String,
    pub td_pct: String,
    pub sub_att: String,
    pub total_rounds: String,
    pub title_bouts: String,
    pub odds: String,
    pub weight: String,
    /// Wins over opponents ranked inside the top-15 at fight time.
    #[serde(default)]
    pub ranked_wins: u32,
}

impl FighterRecord {
    /// Take one corner's snapshot from a fight row. Missing columns become
    /// empty tokens.
    pub fn from_row(row: &FightRow, corner: Corner) -> Self {
        let col = |attr: StatAttribute| {
            row.get(&attr.corner_column(corner))
                .unwrap_or_default()
                .to_string()
        };
        Self {
            name: row.fighter_name(corner).to_string(),
            weight_class: row.get("WeightClass").unwrap_or_default().to_string(),
            rank: row.get(corner.rank_column()).unwrap_or_default().to_string(),
            stance: row
                .get(&format!("{}Stance", corner.prefix()))
                .unwrap_or_default()
                .to_string(),
            height: col(StatAttribute::Height),
            reach: col(StatAttribute::Reach),
            age: col(StatAttribute::Age),
            win_streak: col(StatAttribute::WinStreak),
            losses: col(StatAttribute::Losses),
            wins: col(StatAttribute::Wins),
            sig_str_landed: col(StatAttribute::SigStrLanded),
            sig_str_pct: col(StatAttribute::SigStrPct),
            td_landed: col(StatAttribute::TdLanded),
            td_pct: col(StatAttribute::TdPct),
            sub_att: col(StatAttribute::SubAtt),
            total_rounds: col(StatAttribute::TotalRounds),
            title_bouts: col(StatAttribute::TitleBouts),
            odds: col(StatAttribute::Odds),
            weight: col(StatAttribute::Weight),
            ranked_wins: 0,
        }
    }

    /// Raw token for a numeric attribute.
    pub fn stat(&self, attr: StatAttribute) -> &str {
        match attr {
            StatAttribute::Height => &self.height,
            StatAttribute::Reach => &self.reach,
            StatAttribute::Age => &self.age,
            StatAttribute::WinStreak => &self.win_streak,
            StatAttribute::Losses => &self.losses,
            StatAttribute::Wins => &self.wins,
            StatAttribute::SigStrLanded => &self.sig_str_landed,
            StatAttribute::SigStrPct => &self.sig_str_pct,
            StatAttribute::TdLanded => &self.td_landed,
            StatAttribute::TdPct => &self.td_pct,
            StatAttribute::SubAtt => &self.sub_att,
            StatAttribute::TotalRounds => &self.total_rounds,
            StatAttribute::TitleBouts => &self.title_bouts,
            StatAttribute::Odds => &self.odds,
            StatAttribute::Weight => &self.weight,
        }
    }
}

/// Name → fighter snapshot, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct FighterIndex {
    by_name: HashMap<String, FighterRecord>,
    order: Vec<String>,
}

impl FighterIndex {
    /// Build snapshots and ranked-win counts from the full fight history.
    pub fn from_fights(rows: &[FightRow], ranks: &RankEncoder, ranked_threshold: f64) -> Self {
        let mut index = Self::default();
        for row in rows {
            for corner in Corner::BOTH {
                let name = row.fighter_name(corner);
                if name.is_empty() || index.by_name.contains_key(name) {
                    continue;
                }
                index.insert(FighterRecord::from_row(row, corner));
            }
        }

        for row in rows {
            let Some(winner) = row.winner() else {
                continue;
            };
            let opponent_rank = ranks.encode_opt(row.get(winner.opponent().rank_column()));
            if opponent_rank > ranked_threshold {
                continue;
            }
            if let Some(rec) = index.by_name.get_mut(row.fighter_name(winner)) {
                rec.ranked_wins += 1;
            }
        }

        debug!(fighters = index.len(), fights = rows.len(), "fighter index built");
        index
    }

    /// Insert (or replace) a record, keeping first-seen order.
    pub fn insert(&mut self, record: FighterRecord) {
        if !self.by_name.contains_key(&record.name) {
            self.order.push(record.name.clone());
        }
        self.by_name.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&FighterRecord> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &FighterRecord> + '_ {
        self.order.iter().filter_map(|n| self.by_name.get(n))
    }
}

/// Weight class → fighter names, men's divisions only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightClassIndex(BTreeMap<String, Vec<String>>);

impl WeightClassIndex {
    pub fn from_fighters(fighters: &FighterIndex) -> Self {
        let mut classes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rec in fighters.iter() {
            let wc = rec.weight_class.as_str();
            if wc.is_empty() || wc.contains("Women") {
                continue;
            }
            classes.entry(wc.to_string()).or_default().push(rec.name.clone());
        }
        Self(classes)
    }

    pub fn fighters_in(&self, weight_class: &str) -> &[String] {
        self.0.get(weight_class).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }
}
