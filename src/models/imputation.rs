//! k-nearest-neighbour imputation of a partially observed matrix.
//!
//! Rows are compared with the NaN-Euclidean distance: the squared
//! differences over the columns both rows observe, scaled up by the
//! fraction of columns observed,
//! ```text
//! d(a, b) = sqrt(n_columns / n_present * sum_{present} (a_j - b_j)^2)
//! ```
//! Rows with no column in common, or whose distance overflows, are not
//! neighbours of each other.
//!
//! A missing cell in column `c` is estimated from the `k` nearest rows
//! that observe `c`, falling back to the mean of column `c` when there
//! is no such row.
use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

use super::Weighting;

/// Distance between two rows over their co-observed columns. `None` when
/// there are none, or when the distance is not finite.
pub fn nan_euclidean(a: ArrayView1<Option<f32>>, b: ArrayView1<Option<f32>>) -> Option<f32> {
    let mut present = 0;
    let mut squared_distance = 0.0;

    for (x, y) in izip!(a.iter(), b.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            present += 1;
            squared_distance += (x - y) * (x - y);
        }
    }

    if present == 0 {
        None
    } else {
        Some((a.len() as f32 / present as f32 * squared_distance).sqrt())
            .filter(|distance| distance.is_finite())
    }
}

/// Mean of the observed values of every column. Columns without any
/// observed value get zero. Accumulates in `f64` so that the mean of
/// finite ratings stays finite.
fn column_means(matrix: ArrayView2<Option<f32>>) -> Vec<f32> {
    matrix
        .axis_iter(Axis(1))
        .map(|column| {
            let observed: Vec<f64> = column.iter().filter_map(|x| x.map(f64::from)).collect();

            if observed.is_empty() {
                0.0
            } else {
                (observed.iter().sum::<f64>() / observed.len() as f64) as f32
            }
        })
        .collect()
}

/// Other rows with a defined distance to `row`, nearest first.
/// Equidistant rows keep their row order.
fn neighbours(matrix: ArrayView2<Option<f32>>, row: usize) -> Vec<(usize, f32)> {
    let receiver = matrix.row(row);

    let mut neighbours: Vec<(usize, f32)> = matrix
        .outer_iter()
        .enumerate()
        .filter(|&(other, _)| other != row)
        .filter_map(|(other, donor)| nan_euclidean(receiver, donor).map(|d| (other, d)))
        .collect();

    neighbours.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    neighbours
}

fn impute_row(
    matrix: ArrayView2<Option<f32>>,
    row: usize,
    num_neighbours: usize,
    weighting: &Weighting,
    means: &[f32],
) -> Vec<f32> {
    let receiver = matrix.row(row);

    if receiver.iter().all(|x| x.is_some()) {
        return receiver.iter().filter_map(|x| *x).collect();
    }

    let neighbours = neighbours(matrix, row);

    receiver
        .iter()
        .enumerate()
        .map(|(column, value)| match *value {
            Some(value) => value,
            None => {
                let donors: Vec<(f32, f32)> = neighbours
                    .iter()
                    .filter_map(|&(other, distance)| {
                        matrix[(other, column)].map(|rating| (rating, distance))
                    })
                    .take(num_neighbours)
                    .collect();

                weighting.average(&donors).unwrap_or(means[column])
            }
        })
        .collect()
}

/// Fill every missing cell of `matrix`. Observed cells are copied through.
pub fn impute(
    matrix: ArrayView2<Option<f32>>,
    num_neighbours: usize,
    weighting: &Weighting,
) -> Array2<f32> {
    let means = column_means(matrix);

    let rows: Vec<Vec<f32>> = (0..matrix.nrows())
        .into_par_iter()
        .map(|row| impute_row(matrix, row, num_neighbours, weighting, &means))
        .collect();

    let mut imputed = Array2::zeros(matrix.dim());

    for (mut target, row) in izip!(imputed.outer_iter_mut(), rows) {
        for (cell, value) in izip!(target.iter_mut(), row) {
            *cell = value;
        }
    }

    imputed
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    fn matrix() -> Array2<Option<f32>> {
        arr2(&[
            [Some(1.0), Some(2.0), None, Some(4.0)],
            [Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            [Some(5.0), None, Some(1.0), None],
            [None, None, Some(2.0), Some(2.0)],
        ])
    }

    #[test]
    fn nan_euclidean_scales_by_present_columns() {
        let matrix = matrix();

        // co-observed columns 0 and 2: (1 - 5)^2 + (3 - 1)^2 = 20, scaled by 4 / 2
        let distance = nan_euclidean(matrix.row(1), matrix.row(2)).unwrap();
        assert!((distance - 40.0_f32.sqrt()).abs() < 1e-6);

        assert_eq!(nan_euclidean(matrix.row(0), matrix.row(1)), Some(0.0));
    }

    #[test]
    fn nan_euclidean_without_common_columns() {
        let matrix = arr2(&[[Some(1.0), None], [None, Some(1.0)]]);

        assert_eq!(nan_euclidean(matrix.row(0), matrix.row(1)), None);
    }

    #[test]
    fn overflowing_distance_is_no_neighbour() {
        let matrix = arr2(&[[Some(3e38), Some(3.0)], [Some(-3e38), None]]);

        assert_eq!(nan_euclidean(matrix.row(0), matrix.row(1)), None);
        assert!(neighbours(matrix.view(), 1).is_empty());
    }

    #[test]
    fn neighbours_are_sorted_by_distance() {
        let matrix = matrix();
        let neighbours = neighbours(matrix.view(), 1);

        let order: Vec<usize> = neighbours.iter().map(|&(row, _)| row).collect();
        assert_eq!(order, vec![0, 3, 2]);
        assert!(neighbours.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    }

    #[test]
    fn fills_every_cell_and_keeps_observations() {
        let matrix = matrix();
        let imputed = impute(matrix.view(), 30, &Weighting::Uniform);

        assert_eq!(imputed.dim(), matrix.dim());
        assert!(imputed.iter().all(|x| x.is_finite()));

        for (observed, imputed) in izip!(matrix.iter(), imputed.iter()) {
            if let Some(observed) = observed {
                assert_eq!(observed, imputed);
            }
        }
    }

    #[test]
    fn single_nearest_neighbour() {
        let matrix = matrix();
        let imputed = impute(matrix.view(), 1, &Weighting::Uniform);

        // row 0 is identical to row 1 on everything it observes
        assert_eq!(imputed[(0, 2)], 3.0);
    }

    #[test]
    fn uniform_mean_over_all_donors() {
        let matrix = matrix();
        let imputed = impute(matrix.view(), 30, &Weighting::Uniform);

        // all three other rows observe column 0
        assert!((imputed[(3, 0)] - (1.0 + 1.0 + 5.0) / 3.0).abs() < 1e-6);
    }

    #[test]
    fn falls_back_to_column_mean() {
        let matrix = arr2(&[
            [Some(1.0), None],
            [None, Some(3.0)],
            [None, Some(5.0)],
        ]);
        let imputed = impute(matrix.view(), 30, &Weighting::Uniform);

        assert_eq!(imputed[(0, 1)], 4.0);
        assert_eq!(imputed[(1, 0)], 1.0);
        assert_eq!(imputed[(2, 0)], 1.0);
    }

    #[test]
    fn extreme_ratings_impute_finite_values() {
        let matrix = arr2(&[[Some(3e38), Some(3.0)], [Some(-3e38), None]]);
        let imputed = impute(matrix.view(), 30, &Weighting::Distance);

        assert!(imputed.iter().all(|x| x.is_finite()));
        assert_eq!(imputed[(1, 1)], 3.0);

        // both donors sit at distance zero, but their sum overflows
        let matrix = arr2(&[
            [Some(1.0), Some(3e38)],
            [Some(1.0), Some(3e38)],
            [Some(1.0), None],
        ]);
        let imputed = impute(matrix.view(), 30, &Weighting::Uniform);

        assert_eq!(imputed[(2, 1)], 3e38);
    }
}
