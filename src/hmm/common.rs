//!
//! Checked entry point of the flat HMM kernels
//!
//! `Hmm` validates the transition matrix and the initial distribution once,
//! checks the shape of every emission matrix handed to it, allocates the
//! outputs, and turns NaN results into `HmmError::NumericalError`.
//!
use super::stats;
use crate::error::HmmError;
use crate::float::HmmFloat;
use crate::workspace::Workspace;
use log::warn;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;

///
/// Flat HMM: borrowed views of `A` (M x M) and `pi0` (M).
///
#[derive(Debug, Clone, Copy)]
pub struct Hmm<'a, F> {
    trans: ArrayView2<'a, F>,
    init: ArrayView1<'a, F>,
}

///
/// E-step statistics of one sequence.
///
#[derive(Debug, Clone)]
pub struct ExpectedStats<F> {
    /// `P(z[t] = i | x)` (T x M)
    pub expectations: Array2<F>,
    /// `\sum_t P(z[t] = i, z[t+1] = j | x)` (M x M)
    pub transcounts: Array2<F>,
    /// `log P(x)`
    pub log_likelihood: F,
}

impl<'a, F: HmmFloat> Hmm<'a, F> {
    ///
    /// Validate `trans` (square, rows are distributions) and `init` (a distribution of the same size).
    ///
    pub fn new(trans: ArrayView2<'a, F>, init: ArrayView1<'a, F>) -> Result<Self, HmmError> {
        let n_states = init.len();
        if n_states == 0 {
            return Err(HmmError::InvalidStateCount(0));
        }
        check_dim("transition matrix rows", n_states, trans.nrows())?;
        check_dim("transition matrix columns", n_states, trans.ncols())?;
        check_distribution("initial distribution", init)?;
        check_stochastic(trans)?;
        Ok(Hmm { trans, init })
    }
    /// Number of states `M`
    pub fn n_states(&self) -> usize {
        self.init.len()
    }
    pub fn trans(&self) -> ArrayView2<'a, F> {
        self.trans
    }
    pub fn init(&self) -> ArrayView1<'a, F> {
        self.init
    }
    ///
    /// Check that `abl` is `T x M` with `T >= 1` and has no NaN. Returns `T`.
    ///
    pub fn check_emissions(&self, abl: ArrayView2<F>) -> Result<usize, HmmError> {
        check_emissions(abl, self.n_states())
    }
    ///
    /// Backward log messages `betal` (T x M)
    ///
    pub fn messages_backwards_log(&self, abl: ArrayView2<F>) -> Result<Array2<F>, HmmError> {
        self.check_emissions(abl)?;
        let mut betal = Array2::zeros(abl.dim());
        super::messages_backwards_log(self.trans, abl, betal.view_mut());
        check_no_nan("backward messages", betal.view())?;
        Ok(betal)
    }
    ///
    /// Forward log messages `alphal` (T x M)
    ///
    pub fn messages_forwards_log(&self, abl: ArrayView2<F>) -> Result<Array2<F>, HmmError> {
        self.check_emissions(abl)?;
        let mut alphal = Array2::zeros(abl.dim());
        super::messages_forwards_log(self.trans, self.init, abl, alphal.view_mut());
        check_no_nan("forward messages", alphal.view())?;
        Ok(alphal)
    }
    ///
    /// Normalized forward messages `alphan` (T x M) and `log P(x)`
    ///
    pub fn messages_forwards_normalized(
        &self,
        abl: ArrayView2<F>,
    ) -> Result<(Array2<F>, F), HmmError> {
        self.check_emissions(abl)?;
        let mut alphan = Array2::zeros(abl.dim());
        let logtot =
            super::messages_forwards_normalized(self.trans, self.init, abl, alphan.view_mut());
        let logtot = check_scalar("log likelihood", logtot)?;
        Ok((alphan, logtot))
    }
    ///
    /// `log P(x)`; `-inf` if the observations are impossible under the model.
    ///
    pub fn log_likelihood(&self, abl: ArrayView2<F>) -> Result<F, HmmError> {
        self.messages_forwards_normalized(abl).map(|(_, logtot)| logtot)
    }
    ///
    /// Most probable state sequence and its log joint probability.
    ///
    pub fn viterbi(&self, abl: ArrayView2<F>) -> Result<(Array1<usize>, F), HmmError> {
        let n_steps = self.check_emissions(abl)?;
        let mut stateseq = Array1::zeros(n_steps);
        let score = super::viterbi(self.trans, self.init, abl, stateseq.view_mut())?;
        Ok((stateseq, check_scalar("viterbi score", score)?))
    }
    ///
    /// Posterior sample of the state sequence, drawn forward in time with backward log messages.
    ///
    pub fn sample_forwards<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        abl: ArrayView2<F>,
    ) -> Result<Array1<usize>, HmmError> {
        let n_steps = self.check_emissions(abl)?;
        let mut ws = Workspace::new(self.n_states());
        let mut betal = Array2::zeros(abl.dim());
        super::messages_backwards_log_with(self.trans, abl, betal.view_mut(), &mut ws);
        check_no_nan("backward messages", betal.view())?;
        let mut stateseq = Array1::zeros(n_steps);
        super::sample_forwards_log_with(
            rng,
            self.trans,
            self.init,
            abl,
            betal.view(),
            stateseq.view_mut(),
            &mut ws,
        )?;
        Ok(stateseq)
    }
    ///
    /// Posterior sample of the state sequence by forward-filter backward-sample.
    ///
    pub fn sample_backwards<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        abl: ArrayView2<F>,
    ) -> Result<Array1<usize>, HmmError> {
        let n_steps = self.check_emissions(abl)?;
        let mut ws = Workspace::new(self.n_states());
        let mut alphan = Array2::zeros(abl.dim());
        let logtot = super::messages_forwards_normalized_with(
            self.trans,
            self.init,
            abl,
            alphan.view_mut(),
            &mut ws,
        );
        check_scalar("log likelihood", logtot)?;
        let trans_t = self.trans.t().as_standard_layout().into_owned();
        let mut stateseq = Array1::zeros(n_steps);
        super::sample_backwards_normalized_with(
            rng,
            trans_t.view(),
            alphan.view(),
            stateseq.view_mut(),
            &mut ws,
        )?;
        Ok(stateseq)
    }
    ///
    /// Path of length `n_steps` from the Markov chain alone.
    ///
    pub fn sample_prior<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n_steps: usize,
    ) -> Result<Array1<usize>, HmmError> {
        let mut stateseq = Array1::zeros(n_steps);
        super::sample_prior(rng, self.trans, self.init, stateseq.view_mut())?;
        Ok(stateseq)
    }
    ///
    /// Smoothed posteriors, expected transition counts and log likelihood.
    ///
    pub fn expected_statistics(&self, abl: ArrayView2<F>) -> Result<ExpectedStats<F>, HmmError> {
        self.check_emissions(abl)?;
        let mut ws = Workspace::new(self.n_states());
        let mut alphal = Array2::zeros(abl.dim());
        let mut betal = Array2::zeros(abl.dim());
        super::messages_forwards_log_with(self.trans, self.init, abl, alphal.view_mut(), &mut ws);
        super::messages_backwards_log_with(self.trans, abl, betal.view_mut(), &mut ws);

        let mut expectations = Array2::zeros(abl.dim());
        let log_likelihood =
            stats::expectations(alphal.view(), betal.view(), expectations.view_mut());
        let log_likelihood = check_scalar("log likelihood", log_likelihood)?;
        let mut transcounts = Array2::zeros(self.trans.dim());
        stats::expected_transcounts_with(
            self.trans,
            abl,
            alphal.view(),
            betal.view(),
            log_likelihood,
            transcounts.view_mut(),
            &mut ws,
        );
        check_no_nan("expected statistics", transcounts.view())?;
        Ok(ExpectedStats {
            expectations,
            transcounts,
            log_likelihood,
        })
    }
    ///
    /// Mean log probability of the next `k` observations for each `k` in `blocklens`.
    ///
    pub fn block_predictive_likelihoods(
        &self,
        abl: ArrayView2<F>,
        blocklens: &[usize],
    ) -> Result<Vec<F>, HmmError> {
        let alphal = self.messages_forwards_log(abl)?;
        stats::block_predictive_likelihoods(alphal.view(), blocklens)
    }
}

//
// validation helpers shared with the sub-HMM wrapper
//

pub(crate) fn check_dim(what: &'static str, expected: usize, actual: usize) -> Result<(), HmmError> {
    if expected == actual {
        Ok(())
    } else {
        Err(HmmError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

///
/// Every entry in `[0, 1]` and the total within `F::sum_tolerance()` of one.
///
pub(crate) fn check_distribution<F: HmmFloat>(
    what: &'static str,
    v: ArrayView1<F>,
) -> Result<(), HmmError> {
    for (index, &p) in v.iter().enumerate() {
        if !(p >= F::zero() && p <= F::one()) {
            return Err(HmmError::InvalidProbability {
                what,
                index,
                value: p.as_f64(),
            });
        }
    }
    let sum = v.sum();
    if !abs_diff_eq!(sum, F::one(), epsilon = F::sum_tolerance()) {
        return Err(HmmError::InvalidProbabilitySum {
            what,
            sum: sum.as_f64(),
        });
    }
    Ok(())
}

///
/// Every row of `m` is a distribution.
///
pub(crate) fn check_stochastic<F: HmmFloat>(m: ArrayView2<F>) -> Result<(), HmmError> {
    for ((row, col), &p) in m.indexed_iter() {
        if !(p >= F::zero() && p <= F::one()) {
            return Err(HmmError::InvalidProbability {
                what: "transition probability",
                index: row * m.ncols() + col,
                value: p.as_f64(),
            });
        }
    }
    for (row, r) in m.rows().into_iter().enumerate() {
        let sum = r.sum();
        if !abs_diff_eq!(sum, F::one(), epsilon = F::sum_tolerance()) {
            return Err(HmmError::InvalidTransitionRow {
                row,
                sum: sum.as_f64(),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_emissions<F: HmmFloat>(
    abl: ArrayView2<F>,
    n_states: usize,
) -> Result<usize, HmmError> {
    if abl.nrows() == 0 {
        return Err(HmmError::EmptySequence);
    }
    check_dim("emission log likelihood columns", n_states, abl.ncols())?;
    check_no_nan("emission log likelihoods", abl)?;
    Ok(abl.nrows())
}

pub(crate) fn check_no_nan<F: HmmFloat>(what: &str, a: ArrayView2<F>) -> Result<(), HmmError> {
    match a.indexed_iter().find(|(_, x)| x.is_nan()) {
        Some(((t, i), _)) => {
            warn!("NaN in {} at ({}, {})", what, t, i);
            Err(HmmError::NumericalError(format!(
                "NaN in {} at ({}, {})",
                what, t, i
            )))
        }
        None => Ok(()),
    }
}

pub(crate) fn check_scalar<F: HmmFloat>(what: &str, x: F) -> Result<F, HmmError> {
    if x.is_nan() {
        warn!("{} is NaN", what);
        Err(HmmError::NumericalError(format!("{} is NaN", what)))
    } else {
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_weather;
    use ndarray::array;
    use test_case::test_case;

    #[test]
    fn hmm_checked_accepts_valid_model() {
        let (trans, init, abl) = mock_weather();
        let hmm = Hmm::new(trans.view(), init.view()).unwrap();
        assert_eq!(hmm.n_states(), 2);
        assert_eq!(hmm.check_emissions(abl.view()).unwrap(), abl.nrows());
        let ll = hmm.log_likelihood(abl.view()).unwrap();
        assert!(ll.is_finite() && ll < 0.0);
    }
    #[test_case(array![[0.5, 0.5], [0.2, 0.7]], array![0.5, 0.5] ; "row does not sum to one")]
    #[test_case(array![[1.5, -0.5], [0.5, 0.5]], array![0.5, 0.5] ; "negative entry")]
    #[test_case(array![[0.5, 0.5], [0.5, 0.5]], array![0.4, 0.4] ; "bad initial distribution")]
    #[test_case(array![[0.5, 0.5, 0.0], [0.5, 0.5, 0.0]], array![0.5, 0.5] ; "not square")]
    fn hmm_checked_rejects_invalid_model(trans: Array2<f64>, init: Array1<f64>) {
        assert!(Hmm::new(trans.view(), init.view()).is_err());
    }
    #[test]
    fn hmm_checked_rejects_bad_emissions() {
        let (trans, init, _) = mock_weather();
        let hmm = Hmm::new(trans.view(), init.view()).unwrap();
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            hmm.log_likelihood(empty.view()),
            Err(HmmError::EmptySequence)
        ));
        let wrong = Array2::<f64>::zeros((3, 3));
        assert!(matches!(
            hmm.viterbi(wrong.view()),
            Err(HmmError::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
        let nan = array![[0.0, f64::NAN]];
        assert!(matches!(
            hmm.log_likelihood(nan.view()),
            Err(HmmError::NumericalError(_))
        ));
    }
    #[test]
    fn hmm_checked_row_error_names_the_row() {
        let trans = array![[0.5, 0.5], [0.2, 0.7]];
        let init = array![0.5, 0.5];
        match Hmm::new(trans.view(), init.view()) {
            Err(HmmError::InvalidTransitionRow { row, sum }) => {
                assert_eq!(row, 1);
                assert_abs_diff_eq!(sum, 0.9, epsilon = 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
