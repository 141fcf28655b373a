//! Models module.
mod imputation;
pub mod knn;

/// How the ratings of the nearest neighbours are combined
/// into an estimate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Weighting {
    /// Unweighted mean of the neighbours' ratings.
    Uniform,
    /// Mean weighted by inverse distance. Neighbours at distance zero,
    /// if any, share all the weight.
    Distance,
}

impl Weighting {
    /// Combine `(rating, distance)` pairs. `None` for an empty slice,
    /// or when the average overflows.
    pub fn average(&self, neighbours: &[(f32, f32)]) -> Option<f32> {
        if neighbours.is_empty() {
            return None;
        }

        let weights: Vec<f32> = match *self {
            Weighting::Uniform => vec![1.0; neighbours.len()],
            Weighting::Distance => {
                if neighbours.iter().any(|&(_, distance)| distance == 0.0) {
                    neighbours
                        .iter()
                        .map(|&(_, distance)| if distance == 0.0 { 1.0 } else { 0.0 })
                        .collect()
                } else {
                    neighbours
                        .iter()
                        .map(|&(_, distance)| 1.0 / distance)
                        .collect()
                }
            }
        };

        let total: f32 = weights.iter().sum();
        let weighted: f32 = izip!(neighbours, &weights)
            .map(|(&(rating, _), weight)| rating * weight)
            .sum();

        Some(weighted / total).filter(|average| average.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflowing_average_is_none() {
        let neighbours = [(3e38, 1.0), (3e38, 2.0)];

        assert_eq!(Weighting::Uniform.average(&neighbours), None);
    }

    #[test]
    fn uniform_is_the_plain_mean() {
        let neighbours = [(4.0, 1.0), (2.0, 10.0), (3.0, 0.5)];

        assert_eq!(Weighting::Uniform.average(&neighbours), Some(3.0));
    }

    #[test]
    fn distance_favours_closer_neighbours() {
        let neighbours = [(4.0, 1.0), (1.0, 3.0)];

        // weights 1 and 1/3
        let expected = (4.0 + 1.0 / 3.0) / (1.0 + 1.0 / 3.0);
        let average = Weighting::Distance.average(&neighbours).unwrap();

        assert!((average - expected).abs() < 1e-6);
    }

    #[test]
    fn zero_distance_takes_all_weight() {
        let neighbours = [(5.0, 0.0), (1.0, 0.1), (3.0, 0.0)];

        assert_eq!(Weighting::Distance.average(&neighbours), Some(4.0));
    }

    #[test]
    fn nothing_to_average() {
        assert_eq!(Weighting::Uniform.average(&[]), None);
        assert_eq!(Weighting::Distance.average(&[]), None);
    }
}
