//! Loading MovieLens-format datasets from disk.
//!
//! A MovieLens directory holds a `ratings.csv` file with at least the
//! columns `userId`, `movieId` and `rating`, and a `movies.csv` file with at
//! least `movieId` and `title`. Other columns are ignored; an empty rating
//! field is read as a record without a rating.
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::data::{ItemRecord, RatingRecord, Ratings};
use crate::InvalidInputError;

/// Dataset error types.
#[derive(Debug, Fail)]
pub enum DatasetError {
    /// The dataset path is not a directory.
    #[fail(display = "Not a directory: {}.", path)]
    NotADirectory {
        /// The offending path.
        path: String,
    },
}

const RATING_COLUMNS: &[&str] = &["userId", "movieId", "rating"];
const ITEM_COLUMNS: &[&str] = &["movieId", "title"];

fn read_records<T: DeserializeOwned>(
    path: &Path,
    required_columns: &[&str],
) -> Result<Vec<T>, failure::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    {
        let headers = reader.headers()?;

        for &column in required_columns {
            if !headers.iter().any(|header| header == column) {
                return Err(InvalidInputError::MissingColumn {
                    column: column.to_owned(),
                }
                .into());
            }
        }
    }

    let records = reader.deserialize().collect::<Result<Vec<T>, _>>()?;

    Ok(records)
}

/// Read a ratings table.
pub fn load_ratings<P: AsRef<Path>>(path: P) -> Result<Ratings, failure::Error> {
    let records: Vec<RatingRecord> = read_records(path.as_ref(), RATING_COLUMNS)?;

    Ok(Ratings::from(records))
}

/// Read an items table.
pub fn load_items<P: AsRef<Path>>(path: P) -> Result<Vec<ItemRecord>, failure::Error> {
    read_records(path.as_ref(), ITEM_COLUMNS)
}

/// Read `ratings.csv` and `movies.csv` from a MovieLens directory.
pub fn load_movielens<P: AsRef<Path>>(
    directory: P,
) -> Result<(Ratings, Vec<ItemRecord>), failure::Error> {
    let directory = directory.as_ref();

    if !directory.is_dir() {
        return Err(DatasetError::NotADirectory {
            path: directory.display().to_string(),
        }
        .into());
    }

    let ratings = load_ratings(directory.join("ratings.csv"))?;
    let items = load_items(directory.join("movies.csv"))?;

    tracing::info!(
        directory = %directory.display(),
        num_ratings = ratings.len(),
        num_items = items.len(),
        "loaded movielens dataset"
    );

    Ok((ratings, items))
}
