#![deny(missing_docs)]
//! # knnrec
//!
//! `knnrec` recommends items (movies) to users from a sparse user-item
//! rating matrix. Missing ratings are imputed with a k-nearest-neighbours
//! estimate computed over co-rated items; a user's recommendations are the
//! highest-scoring items they have not yet seen.
//!
//! ## Example
//!
//! ```rust
//! # extern crate knnrec;
//! use knnrec::data::{ItemRecord, RatingRecord};
//! use knnrec::models::knn::Hyperparameters;
//!
//! let ratings = vec![
//!     RatingRecord::new(1, 10, Some(5.0)),
//!     RatingRecord::new(1, 20, Some(3.0)),
//!     RatingRecord::new(2, 10, Some(4.0)),
//!     RatingRecord::new(2, 30, None),
//! ];
//! let items = vec![
//!     ItemRecord::new(10, "Alpha"),
//!     ItemRecord::new(20, "Beta"),
//!     ItemRecord::new(30, "Gamma"),
//! ];
//!
//! let mut model = Hyperparameters::new()
//!     .num_neighbours(30)
//!     .from_seed([42; 16])
//!     .build()
//!     .unwrap();
//!
//! model.fit(&ratings, &items).unwrap();
//!
//! assert_eq!(model.user_predict(2).unwrap(), vec!["Beta".to_owned()]);
//! assert!(model.user_predict(99).is_err());
//! ```
#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate itertools;

#[cfg(feature = "datasets")]
extern crate csv;
#[macro_use]
extern crate failure;
extern crate ndarray;
extern crate rand;
extern crate rand_xorshift;
extern crate rayon;
extern crate serde;
extern crate tracing;

pub mod data;
#[cfg(feature = "datasets")]
pub mod datasets;
pub mod evaluation;
pub mod matrix;
pub mod models;

/// Alias for user identifiers.
pub type UserId = u32;
/// Alias for item identifiers.
pub type ItemId = u32;

/// Errors raised when the input tables cannot be turned into a rating matrix.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum InvalidInputError {
    /// The ratings table is empty, or none of its rows carries a rating.
    #[fail(display = "No ratings supplied.")]
    NoRatings,
    /// A rating is NaN or infinite.
    #[fail(
        display = "Invalid rating for user {} and item {}: non-finite or not a number.",
        user_id, item_id
    )]
    InvalidRating {
        /// Offending user.
        user_id: UserId,
        /// Offending item.
        item_id: ItemId,
    },
    /// The same (user, item) pair appears more than once.
    #[fail(
        display = "Duplicate rating for user {} and item {}.",
        user_id, item_id
    )]
    DuplicateRating {
        /// Offending user.
        user_id: UserId,
        /// Offending item.
        item_id: ItemId,
    },
    /// The same item appears more than once in the items table.
    #[fail(display = "Duplicate entry for item {} in the items table.", item_id)]
    DuplicateItem {
        /// Offending item.
        item_id: ItemId,
    },
    /// A required column is absent from an input table.
    #[fail(display = "Missing required column: {}.", column)]
    MissingColumn {
        /// Name of the absent column.
        column: String,
    },
    /// A hyperparameter is out of range.
    #[fail(display = "Invalid hyperparameter: {}.", name)]
    InvalidHyperparameter {
        /// Name of the hyperparameter.
        name: String,
    },
}

/// Prediction error types.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum PredictionError {
    /// The model has not been fitted yet.
    #[fail(display = "Model has not been fitted.")]
    NotFitted,
    /// The user was not part of the ratings the model was fitted on.
    #[fail(display = "User {} does not exist.", user_id)]
    UserNotFound {
        /// Queried user.
        user_id: UserId,
    },
    /// The item was not part of the ratings the model was fitted on.
    #[fail(display = "Item {} does not exist.", item_id)]
    ItemNotFound {
        /// Queried item.
        item_id: ItemId,
    },
    /// An item known to the rating matrix has no title in the items table.
    #[fail(display = "No title for item {}.", item_id)]
    MissingTitle {
        /// Item without a title.
        item_id: ItemId,
    },
}

/// Trait describing models that can estimate the rating a user
/// would give to a set of items.
pub trait RatingPredictor {
    /// Estimate the ratings `user_id` would give to `item_ids`,
    /// in the order of `item_ids`.
    fn predict(&self, user_id: UserId, item_ids: &[ItemId]) -> Result<Vec<f32>, PredictionError>;
}
