//! Recommender based on k-nearest-neighbour imputation of the rating matrix.
//!
//! Fitting pivots the ratings table into a user x item matrix and estimates
//! every missing rating from the users most similar to the rater, as
//! measured by Euclidean distance over co-rated items. A user's
//! recommendations are the items they have not seen, ranked by their
//! estimated rating.
//!
//! Items nobody rated have nothing to be estimated from. Before imputation,
//! each of them receives a single synthetic rating between 1 and 4 from a
//! randomly chosen user, drawn from the model's random number generator.
use std::collections::HashMap;

use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use tracing::{debug, info};

use super::imputation::impute;
use super::Weighting;
use crate::data::{ItemRecord, RatingRecord};
use crate::matrix::{ImputedMatrix, RatingMatrix};
use crate::{InvalidInputError, ItemId, PredictionError, RatingPredictor, UserId};

/// Hyperparameters describing the KNN recommender.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hyperparameters {
    num_neighbours: usize,
    num_recommendations: usize,
    weighting: Weighting,
    rng: XorShiftRng,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Hyperparameters::new()
    }
}

impl Hyperparameters {
    /// Build new hyperparameters: 30 neighbours, 10 recommendations,
    /// uniform weighting and a randomly seeded generator.
    pub fn new() -> Self {
        Hyperparameters {
            num_neighbours: 30,
            num_recommendations: 10,
            weighting: Weighting::Uniform,
            rng: XorShiftRng::from_seed(rand::thread_rng().gen()),
        }
    }

    /// Set the number of neighbours used to estimate a missing rating.
    pub fn num_neighbours(mut self, num_neighbours: usize) -> Self {
        self.num_neighbours = num_neighbours;
        self
    }

    /// Set the maximum number of items returned per user.
    pub fn num_recommendations(mut self, num_recommendations: usize) -> Self {
        self.num_recommendations = num_recommendations;
        self
    }

    /// Set how neighbour ratings are combined.
    pub fn weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the random number generator.
    pub fn rng(mut self, rng: XorShiftRng) -> Self {
        self.rng = rng;
        self
    }

    /// Set the random number generator from seed.
    pub fn from_seed(mut self, seed: [u8; 16]) -> Self {
        self.rng = XorShiftRng::from_seed(seed);
        self
    }

    /// Set hyperparameters randomly: useful for hyperparameter search.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Hyperparameters {
            num_neighbours: 2_usize.pow(Uniform::new(0, 8).sample(rng)),
            num_recommendations: 10,
            weighting: if Uniform::new(0.0, 1.0).sample(rng) < 0.5 {
                Weighting::Uniform
            } else {
                Weighting::Distance
            },
            rng: XorShiftRng::from_seed(rng.gen()),
        }
    }

    /// Build the recommender.
    pub fn build(self) -> Result<KNNRecommender, InvalidInputError> {
        if self.num_neighbours == 0 {
            return Err(InvalidInputError::InvalidHyperparameter {
                name: "num_neighbours".to_owned(),
            });
        }

        Ok(KNNRecommender {
            hyper: self,
            state: None,
        })
    }
}

#[derive(Clone, Debug)]
struct FittedState {
    original: RatingMatrix,
    imputed: ImputedMatrix,
    titles: HashMap<ItemId, String>,
    empty_columns: Vec<ItemId>,
}

/// KNN imputation recommender.
#[derive(Clone, Debug)]
pub struct KNNRecommender {
    hyper: Hyperparameters,
    state: Option<FittedState>,
}

fn title_lookup(items: &[ItemRecord]) -> Result<HashMap<ItemId, String>, InvalidInputError> {
    let mut titles = HashMap::with_capacity(items.len());

    for item in items {
        if titles
            .insert(item.item_id(), item.title().to_owned())
            .is_some()
        {
            return Err(InvalidInputError::DuplicateItem {
                item_id: item.item_id(),
            });
        }
    }

    Ok(titles)
}

impl KNNRecommender {
    /// Fit the recommender.
    ///
    /// Replaces any previous fit. On error the recommender is left as it was.
    pub fn fit(
        &mut self,
        ratings: &[RatingRecord],
        items: &[ItemRecord],
    ) -> Result<(), InvalidInputError> {
        let titles = title_lookup(items)?;
        let mut original = RatingMatrix::pivot(ratings)?;

        let empty_columns = original.fill_empty_columns(&mut self.hyper.rng);

        let values = impute(
            original.values(),
            self.hyper.num_neighbours,
            &self.hyper.weighting,
        );
        let imputed = ImputedMatrix::new(original.index().clone(), values);

        let (num_users, num_items) = original.shape();
        info!(
            num_users,
            num_items,
            num_ratings = original.num_observed(),
            num_empty_columns = empty_columns.len(),
            num_neighbours = self.hyper.num_neighbours,
            "fitted knn recommender"
        );

        self.state = Some(FittedState {
            original,
            imputed,
            titles,
            empty_columns,
        });

        Ok(())
    }

    fn state(&self) -> Result<&FittedState, PredictionError> {
        self.state.as_ref().ok_or(PredictionError::NotFitted)
    }

    /// Whether `fit` has succeeded at least once.
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The hyperparameters the recommender was built with.
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    /// The pivoted ratings, including synthetic ratings for empty columns.
    pub fn original(&self) -> Result<&RatingMatrix, PredictionError> {
        Ok(&self.state()?.original)
    }

    /// The imputed ratings.
    pub fn imputed(&self) -> Result<&ImputedMatrix, PredictionError> {
        Ok(&self.state()?.imputed)
    }

    /// Items that received a synthetic rating during the last fit.
    pub fn empty_columns(&self) -> Result<&[ItemId], PredictionError> {
        Ok(&self.state()?.empty_columns)
    }

    /// Items `user_id` has not seen, with their estimated ratings, best first.
    ///
    /// At most `num_recommendations` items are returned. Equal scores keep
    /// ascending item order.
    pub fn user_scores(&self, user_id: UserId) -> Result<Vec<(ItemId, f32)>, PredictionError> {
        let state = self.state()?;

        let row = state
            .original
            .index()
            .user_row(user_id)
            .ok_or(PredictionError::UserNotFound { user_id })?;

        let item_ids = state.original.item_ids();
        let scores = state.imputed.values();

        let mut candidates: Vec<(ItemId, f32)> = state
            .original
            .unseen_columns(row)
            .into_iter()
            .map(|column| (item_ids[column], scores[(row, column)]))
            .collect();

        debug!(user_id, num_candidates = candidates.len(), "ranking unseen items");

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(self.hyper.num_recommendations);

        Ok(candidates)
    }

    /// Titles of the items recommended to `user_id`, best first.
    pub fn user_predict(&self, user_id: UserId) -> Result<Vec<String>, PredictionError> {
        let state = self.state()?;

        self.user_scores(user_id)?
            .into_iter()
            .map(|(item_id, _)| {
                state
                    .titles
                    .get(&item_id)
                    .cloned()
                    .ok_or(PredictionError::MissingTitle { item_id })
            })
            .collect()
    }
}

impl RatingPredictor for KNNRecommender {
    fn predict(&self, user_id: UserId, item_ids: &[ItemId]) -> Result<Vec<f32>, PredictionError> {
        let state = self.state()?;
        let index = state.imputed.index();

        let row = index
            .user_row(user_id)
            .ok_or(PredictionError::UserNotFound { user_id })?;

        item_ids
            .iter()
            .map(|&item_id| {
                let column = index
                    .item_column(item_id)
                    .ok_or(PredictionError::ItemNotFound { item_id })?;

                Ok(state.imputed.values()[(row, column)])
            })
            .collect()
    }
}
