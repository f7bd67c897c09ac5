//! Parent selection operators.

use fastrand::Rng;

use crate::error::{GeneticError, Result};

/// Picks an index into a slice of fitness values, ordered fittest first.
pub trait SelectionOperator {
    /// Returns an index in `0..fitness.len()`. `fitness` must not be empty.
    fn select(&self, fitness: &[f64], rng: &mut Rng) -> usize;
}

/// Linear rank selection.
///
/// With `n` candidates, expected offspring counts run linearly from
/// `2 / (f + 1)` for the worst candidate to `2f / (f + 1)` for the best, where `f`
/// is the selection gradient. A gradient of 1 selects uniformly.
#[derive(Debug, Clone, Copy)]
pub struct RankSelection {
    gradient: f64,
}

impl RankSelection {
    pub fn new(gradient: f64) -> Result<Self> {
        if !gradient.is_finite() || gradient < 0.0 {
            return Err(GeneticError::InvalidParameter {
                param: "gradient",
                reason: format!("must be a finite number >= 0, got {gradient}"),
            });
        }
        Ok(Self { gradient })
    }

    #[inline]
    pub fn gradient(&self) -> f64 {
        self.gradient
    }

    /// Selection probability of the candidate at `rank` (1 = worst, `n` = best).
    fn probability(&self, rank: usize, n: usize) -> f64 {
        let n_minus = 2.0 / (self.gradient + 1.0);
        let n_plus = 2.0 * self.gradient / (self.gradient + 1.0);
        let step = (n_plus - n_minus) * (rank - 1) as f64 / (n - 1) as f64;
        (n_minus + step) / n as f64
    }
}

impl SelectionOperator for RankSelection {
    fn select(&self, fitness: &[f64], rng: &mut Rng) -> usize {
        let n = fitness.len();
        if n <= 1 {
            return 0;
        }
        // scan worst to best until one candidate is accepted
        loop {
            for index in (0..n).rev() {
                if rng.f64() < self.probability(n - index, n) {
                    return index;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_gradient_is_rejected() {
        assert!(RankSelection::new(-0.5).is_err());
        assert!(RankSelection::new(f64::NAN).is_err());
        assert!(RankSelection::new(0.0).is_ok());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let selection = RankSelection::new(10.0).unwrap();
        let n = 50;
        let total: f64 = (1..=n).map(|rank| selection.probability(rank, n)).sum();
        assert!((total - 1.0).abs() < 1e-9, "sum was {total}");
    }

    #[test]
    fn test_single_candidate_is_always_selected() {
        let selection = RankSelection::new(10.0).unwrap();
        let mut rng = Rng::with_seed(1);
        assert_eq!(selection.select(&[0.3], &mut rng), 0);
    }

    #[test]
    fn test_selection_prefers_fitter_candidates() {
        let selection = RankSelection::new(10.0).unwrap();
        let mut rng = Rng::with_seed(7);
        let fitness: Vec<f64> = (0..10).map(|i| i as f64 / 10.0).collect();
        let mut counts = [0usize; 10];

        for _ in 0..20_000 {
            counts[selection.select(&fitness, &mut rng)] += 1;
        }

        assert!(counts[0] > counts[9] * 2, "counts: {counts:?}");
        assert!(counts.iter().all(|&c| c > 0), "counts: {counts:?}");
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let selection = RankSelection::new(0.0).unwrap();
        let mut rng = Rng::with_seed(11);
        let fitness = [0.1, 0.2, 0.3];

        for _ in 0..1_000 {
            assert!(selection.select(&fitness, &mut rng) < fitness.len());
        }
    }
}
