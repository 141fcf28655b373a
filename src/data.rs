//! Rating and item records, and train/test splitting of ratings.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::{ItemId, UserId};

/// A single row of the ratings table.
///
/// A record without a rating marks an interaction the user left unscored:
/// the item is considered seen by that user, but contributes no value.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RatingRecord {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    item_id: ItemId,
    rating: Option<f32>,
}

impl RatingRecord {
    /// Build a new rating record.
    pub fn new(user_id: UserId, item_id: ItemId, rating: Option<f32>) -> Self {
        RatingRecord {
            user_id,
            item_id,
            rating,
        }
    }

    /// The rating user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The rated item.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The rating, if one was given.
    pub fn rating(&self) -> Option<f32> {
        self.rating
    }
}

/// A single row of the items table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ItemRecord {
    #[serde(rename = "movieId")]
    item_id: ItemId,
    title: String,
}

impl ItemRecord {
    /// Build a new item record.
    pub fn new<T: Into<String>>(item_id: ItemId, title: T) -> Self {
        ItemRecord {
            item_id,
            title: title.into(),
        }
    }

    /// The item identifier.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// The display title.
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Randomly split `ratings` into train and test sets.
pub fn train_test_split<R: Rng>(
    ratings: &mut Ratings,
    rng: &mut R,
    test_fraction: f32,
) -> (Ratings, Ratings) {
    ratings.shuffle(rng);

    let (test, train) = ratings.split_at((test_fraction * ratings.len() as f32) as usize);

    (train, test)
}

/// A ratings table.
#[derive(Clone, Debug, Default)]
pub struct Ratings {
    ratings: Vec<RatingRecord>,
}

impl Ratings {
    /// Build an empty ratings table.
    pub fn new() -> Self {
        Ratings {
            ratings: Vec::new(),
        }
    }

    /// The underlying records.
    pub fn data(&self) -> &[RatingRecord] {
        &self.ratings
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Append a record.
    pub fn push(&mut self, record: RatingRecord) {
        self.ratings.push(record);
    }

    /// Shuffle the records in place.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.ratings.shuffle(rng);
    }

    /// Split into the first `idx` records and the rest.
    pub fn split_at(&self, idx: usize) -> (Self, Self) {
        let idx = idx.min(self.len());

        let head = Ratings {
            ratings: self.ratings[..idx].to_owned(),
        };
        let tail = Ratings {
            ratings: self.ratings[idx..].to_owned(),
        };

        (head, tail)
    }
}

impl From<Vec<RatingRecord>> for Ratings {
    fn from(ratings: Vec<RatingRecord>) -> Ratings {
        Ratings { ratings }
    }
}
