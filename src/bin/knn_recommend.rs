//! Print recommendations for one user of a MovieLens dataset.
extern crate clap;
extern crate failure;
extern crate knnrec;
extern crate rand;
extern crate rand_xorshift;
extern crate tracing;
extern crate tracing_subscriber;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use knnrec::datasets::load_movielens;
use knnrec::models::knn::Hyperparameters;
use knnrec::PredictionError;

#[derive(Parser, Debug)]
#[command(name = "knn_recommend")]
#[command(about = "Recommend unseen movies to a MovieLens user")]
struct Args {
    /// Directory holding ratings.csv and movies.csv
    #[arg(short, long)]
    data_dir: PathBuf,

    /// User to recommend to
    #[arg(short, long)]
    user_id: u32,

    /// Number of neighbours used to estimate missing ratings
    #[arg(short, long, default_value = "30")]
    neighbours: usize,

    /// Number of recommendations to print
    #[arg(short, long, default_value = "10")]
    count: usize,

    /// Seed for the synthetic ratings given to unrated movies
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), failure::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let (ratings, items) = load_movielens(&args.data_dir)?;

    let mut hyper = Hyperparameters::new()
        .num_neighbours(args.neighbours)
        .num_recommendations(args.count);
    if let Some(seed) = args.seed {
        hyper = hyper.rng(XorShiftRng::seed_from_u64(seed));
    }

    let mut model = hyper.build()?;

    let start = Instant::now();
    model.fit(ratings.data(), &items)?;
    info!(elapsed = ?start.elapsed(), "fit complete");

    match model.user_predict(args.user_id) {
        Ok(titles) => {
            for (rank, title) in titles.iter().enumerate() {
                println!("{:>2}. {}", rank + 1, title);
            }
        }
        Err(PredictionError::UserNotFound { user_id }) => {
            println!("user_id = {} doesn't exist", user_id);
        }
        Err(error) => return Err(error.into()),
    }

    Ok(())
}
