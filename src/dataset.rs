// src/dataset.rs
//! CSV plumbing for the offline pipeline:
//! raw fights → column selection → engineered training rows → train/test
//! split → labeled CSVs read back for training and evaluation.

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::features::{FeatureSet, FeatureVector};
use crate::fighter::FightRow;
use crate::parse::parse_stat;

pub const WINNER_COLUMN: &str = "Winner";

/// Columns kept by the selection step.
pub const PROCESSED_COLUMNS: &[&str] = &[
    "Winner",
    "HeightDif",
    "ReachDif",
    "AgeDif",
    "WinStreakDif",
    "LossDif",
    "SigStrDif",
    "AvgTDDif",
    "BlueAvgSigStrLanded",
    "RedAvgSigStrLanded",
    "BlueAvgSigStrPct",
    "RedAvgSigStrPct",
    "BlueAvgTDLanded",
    "RedAvgTDLanded",
    "BlueAvgTDPct",
    "RedAvgTDPct",
    "BlueAvgSubAtt",
    "RedAvgSubAtt",
    "TotalRoundDif",
    "TotalTitleBoutDif",
    "BlueWins",
    "RedWins",
    "BlueLosses",
    "RedLosses",
    "RedStance",
    "BlueStance",
    "RedOdds",
    "BlueOdds",
    "RedWeightLbs",
    "BlueWeightLbs",
    "RMatchWCRank",
    "BMatchWCRank",
];

/// A CSV file held in memory with its header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<FightRow>,
}

impl Table {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_table_from(file).with_context(|| format!("reading CSV {}", path.display()))
}

/// Blank lines and rows with the wrong field count are skipped.
pub fn read_table_from<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let raw = result?;
        if raw.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if raw.len() != headers.len() {
            warn!(
                line = raw.position().map(|p| p.line()).unwrap_or(0),
                expected = headers.len(),
                found = raw.len(),
                "skipping CSV row with wrong field count"
            );
            continue;
        }
        rows.push(FightRow::from_pairs(
            headers.iter().cloned().zip(raw.iter().map(str::to_string)),
        ));
    }
    debug!(rows = rows.len(), columns = headers.len(), "CSV loaded");
    Ok(Table { headers, rows })
}

pub fn write_table<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_table_to(file, table)
}

pub fn write_table_to<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(table.headers.iter().map(|h| row.get(h).unwrap_or_default()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Keep only `columns`, in that order. Every column must exist in the source.
pub fn select_columns(table: &Table, columns: &[&str]) -> Result<Table> {
    let missing: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        return Err(anyhow!("source is missing columns: {}", missing.join(", ")));
    }
    let rows = table
        .rows
        .iter()
        .map(|row| FightRow::from_pairs(columns.iter().map(|c| (*c, row.get(c).unwrap_or_default()))))
        .collect();
    Ok(Table {
        headers: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

/// One engineered row. Features that were missing or unparseable are simply
/// absent from `features`; an unparseable label is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledRow {
    pub label: Option<f64>,
    pub features: FeatureVector,
}

/// Labeled rows plus the feature column order they were written with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledData {
    pub features: Vec<String>,
    pub rows: Vec<LabeledRow>,
}

/// Training-time feature engineering over historical fights. Fights without
/// a recorded winner are dropped; label is 1 for a red win, else 0.
pub fn engineer_training_rows(rows: &[FightRow], set: &FeatureSet) -> LabeledData {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let winner = row.get(WINNER_COLUMN).map(str::trim).unwrap_or_default();
        if winner.is_empty() {
            continue;
        }
        match set.build(row) {
            Ok(features) => out.push(LabeledRow {
                label: Some(if winner == "Red" { 1.0 } else { 0.0 }),
                features,
            }),
            Err(e) => warn!(error = %e, "skipping fight row"),
        }
    }
    LabeledData {
        features: set.names().map(str::to_string).collect(),
        rows: out,
    }
}

/// Shuffle and split at `ratio` (fraction going to the first half).
pub fn split(mut rows: Vec<LabeledRow>, ratio: f64, seed: Option<u64>) -> (Vec<LabeledRow>, Vec<LabeledRow>) {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    rows.shuffle(&mut rng);
    let at = ((rows.len() as f64) * ratio.clamp(0.0, 1.0)) as usize;
    let test = rows.split_off(at);
    (rows, test)
}

pub fn write_labeled<P: AsRef<Path>>(path: P, features: &[String], rows: &[LabeledRow]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_labeled_to(file, features, rows)
}

/// `Winner` first, then the features; absent values are written empty.
pub fn write_labeled_to<W: Write>(writer: W, features: &[String], rows: &[LabeledRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(std::iter::once(WINNER_COLUMN).chain(features.iter().map(String::as_str)))?;
    for row in rows {
        let label = row.label.map(|l| format!("{l}")).unwrap_or_default();
        let values = features
            .iter()
            .map(|f| row.features.get(f).map(|v| format!("{v}")).unwrap_or_default());
        wtr.write_record(std::iter::once(label).chain(values))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_labeled<P: AsRef<Path>>(path: P) -> Result<LabeledData> {
    Ok(labeled_from_table(&read_table(path)?))
}

/// Every column except `Winner` is a feature column.
pub fn labeled_from_table(table: &Table) -> LabeledData {
    let features: Vec<String> = table
        .headers
        .iter()
        .filter(|h| h.as_str() != WINNER_COLUMN)
        .cloned()
        .collect();
    let rows = table
        .rows
        .iter()
        .map(|row| LabeledRow {
            label: row.get(WINNER_COLUMN).and_then(parse_stat),
            features: features
                .iter()
                .filter_map(|f| row.get(f).and_then(parse_stat).map(|v| (f.clone(), v)))
                .collect(),
        })
        .collect();
    LabeledData { features, rows }
}
