//! Offline pipeline: column selection, train/test preparation, training,
//! evaluation, one-off predictions and upcoming-card predictions.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fight_predictor::config::{PredictorConfig, TrainConfig};
use fight_predictor::dataset::{
    engineer_training_rows, read_labeled, read_table, select_columns, split, write_labeled, write_table,
    PROCESSED_COLUMNS,
};
use fight_predictor::evaluate::evaluate;
use fight_predictor::features::{stance_vocabulary, FeatureSet};
use fight_predictor::predict::{predict_upcoming, PredictionContext, PredictionResponse};
use fight_predictor::training::train;
use fight_predictor::{init_tracing, Model};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep only the columns the pipeline uses
    Select {
        #[arg(long, default_value = "ufc-master.csv")]
        input: PathBuf,
        #[arg(long, default_value = "ufc-processed.csv")]
        output: PathBuf,
    },
    /// Engineer features and write shuffled training / testing CSVs
    Prepare {
        #[arg(long, default_value = "ufc-processed.csv")]
        input: PathBuf,
        #[arg(long, default_value = "training_data.csv")]
        train: PathBuf,
        #[arg(long, default_value = "testing_data.csv")]
        test: PathBuf,
        /// Fraction of rows going to the training set
        #[arg(long, default_value_t = 0.8)]
        ratio: f64,
        /// Fixed shuffle seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fit the logistic model by gradient descent
    Train {
        #[arg(long, default_value = "training_data.csv")]
        data: PathBuf,
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
        #[arg(long)]
        learning_rate: Option<f64>,
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Report accuracy on a labeled CSV
    Evaluate {
        #[arg(long, default_value = "testing_data.csv")]
        data: PathBuf,
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
    },
    /// Predict one matchup using the serving path
    Predict {
        #[arg(long)]
        red: String,
        #[arg(long)]
        blue: String,
        /// Overrides the configured model path
        #[arg(long)]
        model: Option<PathBuf>,
        /// Overrides the configured fight history path
        #[arg(long)]
        fights: Option<PathBuf>,
    },
    /// Predict every bout of an upcoming card
    Upcoming {
        #[arg(long, default_value = "upcoming.csv")]
        input: PathBuf,
        #[arg(long, default_value = "model.json")]
        model: PathBuf,
        #[arg(long, default_value = "predictions.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    match Cli::parse().command {
        Command::Select { input, output } => {
            let table = read_table(&input)?;
            let selected = select_columns(&table, PROCESSED_COLUMNS)?;
            write_table(&output, &selected)?;
            println!("Selected {} rows into {}", selected.rows.len(), output.display());
        }
        Command::Prepare {
            input,
            train: train_path,
            test,
            ratio,
            seed,
        } => {
            let cfg = PredictorConfig::from_env()?;
            let table = read_table(&input)?;
            let set = FeatureSet::with_stances(stance_vocabulary(&table.rows), cfg.rank_encoder());
            let data = engineer_training_rows(&table.rows, &set);
            let (train_rows, test_rows) = split(data.rows, ratio, seed);
            write_labeled(&train_path, &data.features, &train_rows)?;
            write_labeled(&test, &data.features, &test_rows)?;
            println!(
                "Prepared {} training and {} testing rows ({} features)",
                train_rows.len(),
                test_rows.len(),
                data.features.len()
            );
        }
        Command::Train {
            data,
            model,
            learning_rate,
            iterations,
        } => {
            let defaults = TrainConfig::default();
            let cfg = TrainConfig {
                learning_rate: learning_rate.unwrap_or(defaults.learning_rate),
                iterations: iterations.unwrap_or(defaults.iterations),
            };
            let labeled = read_labeled(&data)?;
            let trained = train(&labeled, &cfg)?;
            trained.save_to_file(&model)?;
            println!("Model training complete. Model saved to {}", model.display());
        }
        Command::Evaluate { data, model } => {
            let model = Model::load_from_file(&model)?;
            let labeled = read_labeled(&data)?;
            let report = evaluate(&model, &labeled.rows);
            println!(
                "Model accuracy on the test set: {:.2}% ({}/{}, {} skipped)",
                report.accuracy_pct(),
                report.correct,
                report.counted,
                report.skipped
            );
        }
        Command::Predict {
            red,
            blue,
            model,
            fights,
        } => {
            let mut cfg = PredictorConfig::from_env()?;
            if let Some(m) = model {
                cfg.model_path = m;
            }
            if let Some(f) = fights {
                cfg.fights_path = f;
            }
            let ctx = PredictionContext::load(&cfg)?;
            let resp = PredictionResponse::from(ctx.predict(red.trim(), blue.trim()));
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
        Command::Upcoming { input, model, output } => {
            let cfg = PredictorConfig::from_env()?;
            let model = Model::load_from_file(&model)?;
            let table = read_table(&input)?;
            let predictions = predict_upcoming(&table.rows, &model, cfg.rank_encoder());
            let json = serde_json::to_string_pretty(&predictions)?;
            fs::write(&output, json).with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} predictions to {}", predictions.len(), output.display());
        }
    }
    Ok(())
}
