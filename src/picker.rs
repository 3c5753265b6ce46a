//!
//! Discrete sampling primitive
//!
//! Draw an index with probability proportional to a vector of non-negative
//! weights. The weights need not sum to one; a tiny but nonzero total is
//! fine. All-zero weights are rejected with `HmmError::ZeroWeights`.
//!
use crate::error::HmmError;
use crate::float::HmmFloat;
use ndarray::ArrayView1;
use rand::distributions::{WeightedError, WeightedIndex};
use rand::prelude::*;

///
/// Pick an index of `weights` with probability `weights[i] / sum(weights)`.
///
pub fn sample_discrete<F: HmmFloat, R: Rng + ?Sized>(
    rng: &mut R,
    weights: ArrayView1<F>,
) -> Result<usize, HmmError> {
    sample_discrete_iter(rng, weights.iter().copied())
}

///
/// Pick a position of the weight iterator with probability proportional to
/// its weight, using `WeightedIndex`.
///
/// Used with sparse rows where the weights are computed on the fly.
///
pub fn sample_discrete_iter<F, R, I>(rng: &mut R, weights: I) -> Result<usize, HmmError>
where
    F: HmmFloat,
    R: Rng + ?Sized,
    I: Iterator<Item = F> + Clone,
{
    // the uniform draw inside `WeightedIndex` needs a finite total
    let total = weights.clone().fold(F::zero(), |acc, w| acc + w);
    if total == F::infinity() {
        return Err(HmmError::NumericalError(
            "sampling weights sum to infinity".to_owned(),
        ));
    }
    let dist = WeightedIndex::new(weights.clone()).map_err(|e| match e {
        WeightedError::InvalidWeight => HmmError::InvalidWeight {
            // `!(w >= 0)` also catches NaN
            index: weights.clone().position(|w| !(w >= F::zero())).unwrap_or(0),
        },
        WeightedError::NoItem | WeightedError::AllWeightsZero => HmmError::ZeroWeights,
        _ => HmmError::NumericalError(format!("invalid sampling weights: {}", e)),
    })?;
    Ok(dist.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn picker_never_picks_zero_weight() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let w = array![0.0, 1.0, 0.0];
        for _ in 0..100 {
            assert_eq!(sample_discrete(&mut rng, w.view()).unwrap(), 1);
        }
    }
    #[test]
    fn picker_proportional() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        // unnormalized weights 1:3
        let w = array![0.5f32, 1.5];
        let n = 20000;
        let mut count = [0usize; 2];
        for _ in 0..n {
            count[sample_discrete(&mut rng, w.view()).unwrap()] += 1;
        }
        let freq = count[1] as f64 / n as f64;
        assert_abs_diff_eq!(freq, 0.75, epsilon = 0.02);
    }
    #[test]
    fn picker_tiny_total() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let w = array![1e-300, 3e-300];
        let mut seen = [false; 2];
        for _ in 0..200 {
            seen[sample_discrete(&mut rng, w.view()).unwrap()] = true;
        }
        assert!(seen[0] && seen[1]);
    }
    #[test]
    fn picker_degenerate_weights() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let zeros = array![0.0, 0.0];
        assert!(matches!(
            sample_discrete(&mut rng, zeros.view()),
            Err(HmmError::ZeroWeights)
        ));
        let negative = array![0.5, -0.1];
        assert!(matches!(
            sample_discrete(&mut rng, negative.view()),
            Err(HmmError::InvalidWeight { index: 1 })
        ));
        let nan = array![f64::NAN, 1.0];
        assert!(matches!(
            sample_discrete(&mut rng, nan.view()),
            Err(HmmError::InvalidWeight { index: 0 })
        ));
    }
    #[test]
    fn picker_infinite_total() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let w = array![1.0, f64::INFINITY];
        assert!(matches!(
            sample_discrete(&mut rng, w.view()),
            Err(HmmError::NumericalError(_))
        ));
        let empty: Vec<f64> = vec![];
        assert!(matches!(
            sample_discrete_iter(&mut rng, empty.into_iter()),
            Err(HmmError::ZeroWeights)
        ));
    }
    #[test]
    fn picker_iter() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let w = vec![0.0, 0.0, 2.0];
        let i = sample_discrete_iter(&mut rng, w.iter().copied()).unwrap();
        assert_eq!(i, 2);
    }
}
