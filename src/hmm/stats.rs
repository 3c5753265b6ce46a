//!
//! Quantities derived from forward/backward log messages
//!
//! * smoothed posteriors `P(z[t] = i | x)`
//! * expected transition counts `\sum_t P(z[t] = i, z[t+1] = j | x)`
//! * full log likelihood from either message direction
//! * block predictive log likelihoods
//!
use crate::error::HmmError;
use crate::float::HmmFloat;
use crate::prob::{is_log_zero, logsumexp};
use crate::workspace::Workspace;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2, Zip};

///
/// `log P(x) = logsumexp(alphal[T-1])`
///
pub fn log_likelihood_forwards<F: HmmFloat>(alphal: ArrayView2<F>) -> F {
    match alphal.nrows() {
        0 => F::zero(),
        n => logsumexp(alphal.row(n - 1)),
    }
}

///
/// `log P(x) = logsumexp(log pi0 + aBl[0] + betal[0])`
///
pub fn log_likelihood_backwards<F: HmmFloat>(
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    betal: ArrayView2<F>,
) -> F {
    if abl.nrows() == 0 {
        return F::zero();
    }
    let mut v = Array1::zeros(init.len());
    Zip::from(&mut v)
        .and(&init)
        .and(abl.row(0))
        .and(betal.row(0))
        .for_each(|x, &p, &a, &b| *x = p.ln() + a + b);
    logsumexp(v.view())
}

///
/// Fill `out` (T x M) with the smoothed posteriors
///
/// ```text
/// out[t][i] = exp(alphal[t][i] + betal[t][i] - logsumexp(alphal[t] + betal[t]))
/// ```
///
/// and return the log likelihood. A dead sequence gives all-zero rows and `-inf`.
///
pub fn expectations<F: HmmFloat>(
    alphal: ArrayView2<F>,
    betal: ArrayView2<F>,
    mut out: ArrayViewMut2<F>,
) -> F {
    debug_assert_eq!(alphal.dim(), betal.dim());
    debug_assert_eq!(alphal.dim(), out.dim());
    for t in 0..alphal.nrows() {
        let mut row = out.row_mut(t);
        Zip::from(&mut row)
            .and(alphal.row(t))
            .and(betal.row(t))
            .for_each(|x, &a, &b| *x = a + b);
        let lse = logsumexp(row.view());
        if is_log_zero(lse) {
            row.fill(F::zero());
        } else {
            row.mapv_inplace(|x| (x - lse).exp());
        }
    }
    log_likelihood_forwards(alphal)
}

///
/// Fill `out` (M x M) with the expected transition counts
///
/// ```text
/// out[i][j] = \sum_{t<T-1} exp(alphal[t][i] + log A[i,j] + aBl[t+1][j] + betal[t+1][j] - log P(x))
/// ```
///
/// Each step is shifted by its own maximum and normalized to sum to one, so
/// nothing overflows when a likely state at `t` and a likely state at `t+1`
/// are joined only by an improbable transition. `out` is zeroed first and
/// stays zero for a dead sequence (`log_likelihood == -inf`).
///
pub fn expected_transcounts<F: HmmFloat>(
    trans: ArrayView2<F>,
    abl: ArrayView2<F>,
    alphal: ArrayView2<F>,
    betal: ArrayView2<F>,
    log_likelihood: F,
    out: ArrayViewMut2<F>,
) {
    let mut ws = Workspace::new(abl.ncols());
    expected_transcounts_with(trans, abl, alphal, betal, log_likelihood, out, &mut ws)
}

///
/// `expected_transcounts` using the given scratch buffers.
///
pub fn expected_transcounts_with<F: HmmFloat>(
    trans: ArrayView2<F>,
    abl: ArrayView2<F>,
    alphal: ArrayView2<F>,
    betal: ArrayView2<F>,
    log_likelihood: F,
    mut out: ArrayViewMut2<F>,
    ws: &mut Workspace<F>,
) {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(trans.dim(), (n_states, n_states));
    debug_assert_eq!(out.dim(), (n_states, n_states));
    out.fill(F::zero());
    if !log_likelihood.is_finite() {
        return;
    }
    let mut future = ws.scratch(n_states, 0).a;
    let log_trans = trans.mapv(|x| x.ln());
    let mut pair = Array2::zeros((n_states, n_states));

    for t in 0..n_steps.saturating_sub(1) {
        Zip::from(&mut future)
            .and(abl.row(t + 1))
            .and(betal.row(t + 1))
            .for_each(|x, &a, &b| *x = a + b);
        for ((i, j), x) in pair.indexed_iter_mut() {
            *x = alphal[[t, i]] + log_trans[[i, j]] + future[j];
        }
        let cmax = pair.fold(F::neg_infinity(), |m, &x| m.max(x));
        if !cmax.is_finite() {
            continue;
        }
        pair.mapv_inplace(|x| (x - cmax).exp());
        let z = pair.sum();
        out.scaled_add(F::one() / z, &pair);
    }
}

///
/// Block predictive log likelihoods
///
/// For each `k` in `blocklens`, the mean over `t` of
///
/// ```text
/// log P(x[0:t+k+1]) - log P(x[0:t+1])  =  logsumexp(alphal[t+k]) - logsumexp(alphal[t])
/// ```
///
/// i.e. the average log probability of the next `k` observations given the
/// past. Every `k` must satisfy `1 <= k < T`. Steps whose prefix already has
/// zero probability contribute `-inf`.
///
pub fn block_predictive_likelihoods<F: HmmFloat>(
    alphal: ArrayView2<F>,
    blocklens: &[usize],
) -> Result<Vec<F>, HmmError> {
    let n_steps = alphal.nrows();
    let prefix: Array1<F> = alphal.rows().into_iter().map(logsumexp).collect();
    blocklens
        .iter()
        .map(|&k| {
            if k == 0 || k >= n_steps {
                return Err(HmmError::InvalidBlockLength { len: k, n_steps });
            }
            let n = n_steps - k;
            let total: F = (0..n)
                .map(|t| {
                    if is_log_zero(prefix[t]) {
                        F::neg_infinity()
                    } else {
                        prefix[t + k] - prefix[t]
                    }
                })
                .sum();
            Ok(total / F::of(n as f64))
        })
        .collect()
}
