//! Accuracy of estimated ratings on held-out data.
use rayon::prelude::*;

use crate::data::Ratings;
use crate::{PredictionError, RatingPredictor};

/// Evaluation error types.
#[derive(Debug, Fail)]
pub enum EvaluationError {
    /// No test rating involved a user and item known to the model.
    #[fail(display = "No test rating could be scored.")]
    NoScorableRatings,
    /// The model failed to produce a prediction.
    #[fail(display = "Prediction failed: {}", _0)]
    Prediction(#[cause] PredictionError),
}

impl From<PredictionError> for EvaluationError {
    fn from(error: PredictionError) -> Self {
        EvaluationError::Prediction(error)
    }
}

/// Differences between predicted and actual ratings, over the test records
/// that carry a rating and whose user and item the model knows.
fn residuals<T: RatingPredictor + Sync>(
    model: &T,
    test: &Ratings,
) -> Result<Vec<f32>, EvaluationError> {
    let residuals: Vec<Option<f32>> = test
        .data()
        .par_iter()
        .filter_map(|record| record.rating().map(|rating| (record, rating)))
        .map(
            |(record, rating)| match model.predict(record.user_id(), &[record.item_id()]) {
                Ok(predictions) => Ok(Some(predictions[0] - rating)),
                Err(PredictionError::UserNotFound { .. })
                | Err(PredictionError::ItemNotFound { .. }) => Ok(None),
                Err(error) => Err(error),
            },
        )
        .collect::<Result<_, _>>()?;

    let residuals: Vec<f32> = residuals.into_iter().flatten().collect();

    if residuals.is_empty() {
        Err(EvaluationError::NoScorableRatings)
    } else {
        Ok(residuals)
    }
}

/// Root mean squared error of the model's estimates on `test`.
pub fn rmse_score<T: RatingPredictor + Sync>(
    model: &T,
    test: &Ratings,
) -> Result<f32, EvaluationError> {
    let residuals = residuals(model, test)?;
    let squared: f32 = residuals.iter().map(|x| x * x).sum();

    Ok((squared / residuals.len() as f32).sqrt())
}

/// Mean absolute error of the model's estimates on `test`.
pub fn mae_score<T: RatingPredictor + Sync>(
    model: &T,
    test: &Ratings,
) -> Result<f32, EvaluationError> {
    let residuals = residuals(model, test)?;
    let absolute: f32 = residuals.iter().map(|x| x.abs()).sum();

    Ok(absolute / residuals.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RatingRecord, Ratings};
    use crate::{ItemId, UserId};

    /// Predicts the same rating for everything it knows.
    struct Constant {
        rating: f32,
        users: Vec<UserId>,
    }

    impl RatingPredictor for Constant {
        fn predict(
            &self,
            user_id: UserId,
            item_ids: &[ItemId],
        ) -> Result<Vec<f32>, PredictionError> {
            if self.users.contains(&user_id) {
                Ok(vec![self.rating; item_ids.len()])
            } else {
                Err(PredictionError::UserNotFound { user_id })
            }
        }
    }

    fn test_ratings() -> Ratings {
        Ratings::from(vec![
            RatingRecord::new(1, 1, Some(4.0)),
            RatingRecord::new(1, 2, Some(2.0)),
            RatingRecord::new(1, 3, None),
            RatingRecord::new(2, 1, Some(1.0)),
        ])
    }

    #[test]
    fn scores_known_users_only() {
        let model = Constant {
            rating: 3.0,
            users: vec![1],
        };

        assert_eq!(rmse_score(&model, &test_ratings()).unwrap(), 1.0);
        assert_eq!(mae_score(&model, &test_ratings()).unwrap(), 1.0);
    }

    #[test]
    fn rmse_penalises_large_errors() {
        let model = Constant {
            rating: 3.0,
            users: vec![1, 2],
        };

        let rmse = rmse_score(&model, &test_ratings()).unwrap();
        let mae = mae_score(&model, &test_ratings()).unwrap();

        assert!((rmse - 2.0_f32.sqrt()).abs() < 1e-6);
        assert!((mae - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn nothing_to_score() {
        let model = Constant {
            rating: 3.0,
            users: vec![],
        };

        match rmse_score(&model, &test_ratings()) {
            Err(EvaluationError::NoScorableRatings) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn fitted_model_reproduces_training_ratings() {
        use crate::data::ItemRecord;
        use crate::models::knn::Hyperparameters;

        let train = test_ratings();
        let items: Vec<_> = (1..4)
            .map(|item_id| ItemRecord::new(item_id, format!("Movie {}", item_id)))
            .collect();

        let mut model = Hyperparameters::new().from_seed([42; 16]).build().unwrap();
        model.fit(train.data(), &items).unwrap();

        assert_eq!(rmse_score(&model, &train).unwrap(), 0.0);
    }
}
