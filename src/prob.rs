//!
//! Numerically stable helpers shared by the message kernels
//!
//! Log probabilities use `-inf` for zero probability. Before a row of log
//! probabilities is exponentiated it is shifted by its maximum so that the
//! largest entry becomes `exp(0) = 1`; the maximum is added back after the
//! product is taken back to log space.
//!
use crate::float::HmmFloat;
use ndarray::{ArrayView1, ArrayViewMut1, Zip};

///
/// Maximum coefficient of the vector.
///
/// `-inf` for an empty vector. NaN entries are skipped.
///
pub fn max_coeff<F: HmmFloat>(v: ArrayView1<F>) -> F {
    v.fold(F::neg_infinity(), |m, &x| m.max(x))
}

///
/// `(index, value)` of the maximum coefficient.
///
/// Ties resolve to the lowest index, and NaN never wins. If every entry is
/// `-inf` (or the vector is empty) the result is `(0, -inf)`.
///
pub fn argmax<F: HmmFloat>(v: ArrayView1<F>) -> (usize, F) {
    let mut best = (0, F::neg_infinity());
    for (i, &x) in v.iter().enumerate() {
        if x > best.1 {
            best = (i, x);
        }
    }
    best
}

///
/// Write `exp(v - max(v))` into `out` and return `max(v)`.
///
/// If the maximum is not finite (all of `v` is `-inf`), `out` is filled with
/// zeros instead of `exp(-inf - -inf) = NaN`.
///
pub fn exp_shifted_into<F: HmmFloat>(v: ArrayView1<F>, mut out: ArrayViewMut1<F>) -> F {
    let cmax = max_coeff(v);
    if cmax.is_finite() {
        Zip::from(&mut out)
            .and(&v)
            .for_each(|o, &x| *o = (x - cmax).exp());
    } else {
        out.fill(F::zero());
    }
    cmax
}

///
/// In-place version of `exp_shifted_into`.
///
pub fn exp_shifted_inplace<F: HmmFloat>(mut v: ArrayViewMut1<F>) -> F {
    let cmax = max_coeff(v.view());
    if cmax.is_finite() {
        v.mapv_inplace(|x| (x - cmax).exp());
    } else {
        v.fill(F::zero());
    }
    cmax
}

///
/// `log(exp(x) + exp(y))`
///
/// ```text
/// log(exp(x) + exp(y))
///  = log(exp(x) (1 + exp(y-x)))
///  = x + log(1 + exp(y-x))
/// ```
///
pub fn logaddexp<F: HmmFloat>(x: F, y: F) -> F {
    let (x, y) = if x >= y { (x, y) } else { (y, x) };
    if y == F::neg_infinity() {
        // x + 0 = x
        x
    } else if x == y {
        // x + x = 2x
        x + F::of(2f64.ln())
    } else {
        x + (y - x).exp().ln_1p()
    }
}

///
/// `log(sum(exp(v)))` computed with the max shift.
///
/// `-inf` if every entry is `-inf`.
///
pub fn logsumexp<F: HmmFloat>(v: ArrayView1<F>) -> F {
    let cmax = max_coeff(v);
    if !cmax.is_finite() {
        return cmax;
    }
    let s: F = v.iter().map(|&x| (x - cmax).exp()).sum();
    s.ln() + cmax
}

///
/// Check the value is a log probability of zero, i.e. `-inf`.
///
#[inline]
pub fn is_log_zero<F: HmmFloat>(x: F) -> bool {
    x.is_infinite() && x.is_sign_negative()
}
