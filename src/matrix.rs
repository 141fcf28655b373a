//! Labelled user x item rating matrices.
//!
//! A [`RatingMatrix`] is the pivot of a ratings table: one row per user,
//! one column per item, both in ascending identifier order, with missing
//! cells kept as `None`. An [`ImputedMatrix`] carries the same labels with
//! every cell filled.
use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::data::RatingRecord;
use crate::{InvalidInputError, ItemId, UserId};

/// Row and column labels shared by the original and imputed matrices.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixIndex {
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_rows: HashMap<UserId, usize>,
    item_columns: HashMap<ItemId, usize>,
}

impl MatrixIndex {
    fn new(user_ids: Vec<UserId>, item_ids: Vec<ItemId>) -> Self {
        let user_rows = user_ids.iter().enumerate().map(|(i, &x)| (x, i)).collect();
        let item_columns = item_ids.iter().enumerate().map(|(i, &x)| (x, i)).collect();

        MatrixIndex {
            user_ids,
            item_ids,
            user_rows,
            item_columns,
        }
    }

    /// Row labels, ascending.
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Column labels, ascending.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Row position of `user_id`.
    pub fn user_row(&self, user_id: UserId) -> Option<usize> {
        self.user_rows.get(&user_id).cloned()
    }

    /// Column position of `item_id`.
    pub fn item_column(&self, item_id: ItemId) -> Option<usize> {
        self.item_columns.get(&item_id).cloned()
    }

    /// Number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        (self.user_ids.len(), self.item_ids.len())
    }
}

/// The user x item matrix of observed ratings.
#[derive(Clone, Debug)]
pub struct RatingMatrix {
    index: MatrixIndex,
    values: Array2<Option<f32>>,
    seen: Array2<bool>,
}

impl RatingMatrix {
    /// Pivot a ratings table into a matrix.
    ///
    /// Every user and item mentioned by a record gets a row or column,
    /// including those whose records carry no rating.
    pub fn pivot(ratings: &[RatingRecord]) -> Result<Self, InvalidInputError> {
        if !ratings.iter().any(|x| x.rating().is_some()) {
            return Err(InvalidInputError::NoRatings);
        }

        let user_ids: BTreeSet<_> = ratings.iter().map(|x| x.user_id()).collect();
        let item_ids: BTreeSet<_> = ratings.iter().map(|x| x.item_id()).collect();
        let index = MatrixIndex::new(
            user_ids.into_iter().collect(),
            item_ids.into_iter().collect(),
        );

        let mut values: Array2<Option<f32>> = Array2::from_elem(index.shape(), None);
        let mut seen = Array2::from_elem(index.shape(), false);

        for record in ratings {
            let (user_id, item_id) = (record.user_id(), record.item_id());

            if let Some(rating) = record.rating() {
                if !rating.is_finite() {
                    return Err(InvalidInputError::InvalidRating { user_id, item_id });
                }
            }

            let cell = (index.user_rows[&user_id], index.item_columns[&item_id]);

            if seen[cell] {
                return Err(InvalidInputError::DuplicateRating { user_id, item_id });
            }

            seen[cell] = true;
            values[cell] = record.rating();
        }

        Ok(RatingMatrix {
            index,
            values,
            seen,
        })
    }

    /// Row and column labels.
    pub fn index(&self) -> &MatrixIndex {
        &self.index
    }

    /// Row labels, ascending.
    pub fn user_ids(&self) -> &[UserId] {
        self.index.user_ids()
    }

    /// Column labels, ascending.
    pub fn item_ids(&self) -> &[ItemId] {
        self.index.item_ids()
    }

    /// Number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        self.index.shape()
    }

    /// All cells, `None` where missing.
    pub fn values(&self) -> ArrayView2<Option<f32>> {
        self.values.view()
    }

    /// The value at (`user_id`, `item_id`), `None` if missing or unknown.
    pub fn get(&self, user_id: UserId, item_id: ItemId) -> Option<f32> {
        let row = self.index.user_row(user_id)?;
        let column = self.index.item_column(item_id)?;

        self.values[(row, column)]
    }

    /// Number of non-missing cells.
    pub fn num_observed(&self) -> usize {
        self.values.iter().filter(|x| x.is_some()).count()
    }

    /// Columns without a single non-missing cell. A column rated by one
    /// user already has a value to impute from and is not empty.
    pub fn empty_columns(&self) -> Vec<usize> {
        self.values
            .axis_iter(Axis(1))
            .enumerate()
            .filter(|(_, column)| column.iter().all(|x| x.is_none()))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Give every empty column one synthetic rating, drawn uniformly
    /// from {1, 2, 3, 4} and placed at a uniformly random row.
    ///
    /// Returns the identifiers of the filled items.
    pub fn fill_empty_columns<R: Rng>(&mut self, rng: &mut R) -> Vec<ItemId> {
        let rows = Uniform::new(0, self.values.nrows());
        let ratings = Uniform::new_inclusive(1, 4);

        let empty_columns = self.empty_columns();
        let mut filled = Vec::with_capacity(empty_columns.len());

        for column in empty_columns {
            let row = rows.sample(rng);
            let rating = ratings.sample(rng) as f32;
            let item_id = self.index.item_ids[column];

            tracing::debug!(
                item_id,
                user_id = self.index.user_ids[row],
                rating,
                "synthetic rating for empty column"
            );

            self.values[(row, column)] = Some(rating);
            filled.push(item_id);
        }

        filled
    }

    /// Columns the user in `row` has neither rated nor interacted with,
    /// in column order.
    pub fn unseen_columns(&self, row: usize) -> Vec<usize> {
        let values = self.values.row(row);
        let seen = self.seen.row(row);

        izip!(values.iter(), seen.iter())
            .enumerate()
            .filter(|&(_, (value, seen))| value.is_none() && !*seen)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// The rating matrix with every missing cell estimated.
#[derive(Clone, Debug)]
pub struct ImputedMatrix {
    index: MatrixIndex,
    values: Array2<f32>,
}

impl ImputedMatrix {
    /// Attach `index` labels to raw imputed values.
    ///
    /// # Panics
    /// If the shape of `values` differs from the shape of `index`.
    pub fn new(index: MatrixIndex, values: Array2<f32>) -> Self {
        assert_eq!(values.dim(), index.shape(), "imputed matrix shape mismatch");

        ImputedMatrix { index, values }
    }

    /// Row and column labels.
    pub fn index(&self) -> &MatrixIndex {
        &self.index
    }

    /// Row labels, ascending.
    pub fn user_ids(&self) -> &[UserId] {
        self.index.user_ids()
    }

    /// Column labels, ascending.
    pub fn item_ids(&self) -> &[ItemId] {
        self.index.item_ids()
    }

    /// All cells.
    pub fn values(&self) -> ArrayView2<f32> {
        self.values.view()
    }

    /// The value at (`user_id`, `item_id`), `None` if either is unknown.
    pub fn get(&self, user_id: UserId, item_id: ItemId) -> Option<f32> {
        let row = self.index.user_row(user_id)?;
        let column = self.index.item_column(item_id)?;

        Some(self.values[(row, column)])
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn records() -> Vec<RatingRecord> {
        vec![
            RatingRecord::new(7, 30, Some(2.0)),
            RatingRecord::new(1, 10, Some(5.0)),
            RatingRecord::new(1, 20, Some(3.0)),
            RatingRecord::new(7, 10, Some(4.0)),
            RatingRecord::new(7, 40, None),
        ]
    }

    #[test]
    fn pivot_sorts_labels_and_keeps_missing_cells() {
        let matrix = RatingMatrix::pivot(&records()).unwrap();

        assert_eq!(matrix.user_ids(), &[1, 7]);
        assert_eq!(matrix.item_ids(), &[10, 20, 30, 40]);
        assert_eq!(matrix.shape(), (2, 4));
        assert_eq!(matrix.num_observed(), 4);

        assert_eq!(matrix.get(1, 10), Some(5.0));
        assert_eq!(matrix.get(7, 30), Some(2.0));
        assert_eq!(matrix.get(1, 30), None);
        assert_eq!(matrix.get(7, 40), None);
        assert_eq!(matrix.get(99, 10), None);
    }

    #[test]
    fn pivot_rejects_empty_tables() {
        assert_eq!(
            RatingMatrix::pivot(&[]).unwrap_err(),
            InvalidInputError::NoRatings
        );
        assert_eq!(
            RatingMatrix::pivot(&[RatingRecord::new(1, 1, None)]).unwrap_err(),
            InvalidInputError::NoRatings
        );
    }

    #[test]
    fn pivot_rejects_duplicates() {
        let mut ratings = records();
        ratings.push(RatingRecord::new(1, 20, Some(1.0)));

        assert_eq!(
            RatingMatrix::pivot(&ratings).unwrap_err(),
            InvalidInputError::DuplicateRating {
                user_id: 1,
                item_id: 20
            }
        );
    }

    #[test]
    fn pivot_rejects_non_finite_ratings() {
        let mut ratings = records();
        ratings.push(RatingRecord::new(1, 50, Some(std::f32::NAN)));

        assert_eq!(
            RatingMatrix::pivot(&ratings).unwrap_err(),
            InvalidInputError::InvalidRating {
                user_id: 1,
                item_id: 50
            }
        );
    }

    #[test]
    fn fills_only_empty_columns() {
        let mut matrix = RatingMatrix::pivot(&records()).unwrap();
        let before = matrix.values().to_owned();

        assert_eq!(matrix.empty_columns(), vec![3]);

        let mut rng = XorShiftRng::from_seed([42; 16]);
        let filled = matrix.fill_empty_columns(&mut rng);

        assert_eq!(filled, vec![40]);
        assert!(matrix.empty_columns().is_empty());

        let column: Vec<f32> = matrix.values().column(3).iter().filter_map(|x| *x).collect();
        assert_eq!(column.len(), 1);
        assert!([1.0, 2.0, 3.0, 4.0].contains(&column[0]));

        for column in 0..3 {
            assert_eq!(matrix.values().column(column), before.column(column));
        }
    }

    #[test]
    fn single_rating_is_left_alone() {
        let ratings = vec![
            RatingRecord::new(1, 10, Some(4.0)),
            RatingRecord::new(1, 20, Some(2.0)),
            RatingRecord::new(2, 10, Some(3.0)),
            RatingRecord::new(3, 10, Some(5.0)),
        ];
        let mut matrix = RatingMatrix::pivot(&ratings).unwrap();
        let before = matrix.values().to_owned();

        assert!(matrix.empty_columns().is_empty());
        assert!(matrix
            .fill_empty_columns(&mut XorShiftRng::from_seed([42; 16]))
            .is_empty());
        assert_eq!(matrix.values(), &before);
    }

    #[test]
    fn fill_is_reproducible_for_a_seed() {
        let ratings: Vec<_> = (0..50)
            .map(|item_id| RatingRecord::new(item_id % 5, item_id, None))
            .chain(Some(RatingRecord::new(0, 100, Some(5.0))))
            .collect();

        let fill = || {
            let mut matrix = RatingMatrix::pivot(&ratings).unwrap();
            matrix.fill_empty_columns(&mut XorShiftRng::from_seed([7; 16]));
            matrix.values().to_owned()
        };

        assert_eq!(fill(), fill());
    }

    #[test]
    fn unseen_columns_exclude_unrated_interactions() {
        let matrix = RatingMatrix::pivot(&records()).unwrap();

        assert_eq!(matrix.unseen_columns(0), vec![2, 3]);
        assert_eq!(matrix.unseen_columns(1), vec![1]);
    }

    #[test]
    fn imputed_matrix_lookups() {
        let matrix = RatingMatrix::pivot(&records()).unwrap();
        let imputed = ImputedMatrix::new(matrix.index().clone(), Array2::from_elem((2, 4), 1.5));

        assert_eq!(imputed.index(), matrix.index());
        assert_eq!(imputed.get(7, 20), Some(1.5));
        assert_eq!(imputed.get(7, 99), None);
    }

    #[test]
    #[should_panic]
    fn imputed_matrix_checks_shape() {
        let matrix = RatingMatrix::pivot(&records()).unwrap();
        ImputedMatrix::new(matrix.index().clone(), Array2::zeros((4, 2)));
    }
}
