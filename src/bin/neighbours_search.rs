//! Random search over KNN hyperparameters, scored by held-out RMSE.
//!
//! Every trial is appended to a JSON results file, kept sorted so that
//! the best configuration found so far comes last.
extern crate clap;
extern crate failure;
extern crate knnrec;
extern crate rand;
extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate serde_derive;
extern crate tracing;
extern crate tracing_subscriber;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use knnrec::data::train_test_split;
use knnrec::datasets::load_movielens;
use knnrec::evaluation::{mae_score, rmse_score};
use knnrec::models::knn::Hyperparameters;

#[derive(Parser, Debug)]
#[command(name = "neighbours_search")]
#[command(about = "Search KNN recommender hyperparameters on a MovieLens dataset")]
struct Args {
    /// Directory holding ratings.csv and movies.csv
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Number of random configurations to try
    #[arg(short, long, default_value = "20")]
    iterations: usize,

    /// Fraction of ratings held out for testing
    #[arg(long, default_value = "0.2")]
    test_fraction: f32,

    /// JSON file the results are accumulated in
    #[arg(short, long, default_value = "knn_results.json")]
    results: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Trial {
    test_rmse: f32,
    test_mae: f32,
    elapsed: Duration,
    hyperparameters: Hyperparameters,
}

fn main() -> Result<(), failure::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let (mut data, items) = load_movielens(&args.data_dir)?;
    let mut rng = rand::thread_rng();

    // Imputation only scores users it was fitted on, so split by record.
    let (train, test) = train_test_split(&mut data, &mut rng, args.test_fraction);
    info!(train = train.len(), test = test.len(), "split ratings");

    for _ in 0..args.iterations {
        let mut results: Vec<Trial> = File::open(&args.results)
            .ok()
            .and_then(|file| serde_json::from_reader(&file).ok())
            .unwrap_or_default();

        let hyper = Hyperparameters::random(&mut rng);

        let start = Instant::now();
        let mut model = hyper.clone().build()?;
        model.fit(train.data(), &items)?;

        let trial = Trial {
            test_rmse: rmse_score(&model, &test)?,
            test_mae: mae_score(&model, &test)?,
            elapsed: start.elapsed(),
            hyperparameters: hyper,
        };

        info!(rmse = trial.test_rmse, mae = trial.test_mae, "{:?}", trial.hyperparameters);

        if trial.test_rmse.is_finite() {
            results.push(trial);
            results.sort_by(|a, b| b.test_rmse.total_cmp(&a.test_rmse));
        } else {
            warn!("discarding non-finite result");
        }

        info!("Best result: {:#?}", results.last());

        serde_json::to_writer_pretty(File::create(&args.results)?, &results)?;
    }

    Ok(())
}
