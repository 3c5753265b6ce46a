//!
//! Forward algorithm definitions
//!
//! * log space: `messages_forwards_log`
//! * normalized space: `messages_forwards_normalized`
//!
use crate::float::HmmFloat;
use crate::prob::exp_shifted_into;
use crate::workspace::Workspace;
use log::debug;
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{s, ArrayView1, ArrayView2, ArrayViewMut2, Zip};

///
/// Run Forward algorithm in log space and fill `alphal` (T x M).
///
/// ```text
/// alphal[0]   = log(pi0) + aBl[0]
/// alphal[t+1] = log(exp(alphal[t] - cmax) . A) + cmax + aBl[t+1]
///               where cmax = max(alphal[t])
/// ```
///
/// If `cmax` is not finite (every state at `t` has zero probability), the
/// rows `t+1..T` are filled with `-inf` and the recursion stops there.
///
pub fn messages_forwards_log<F: HmmFloat>(
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    alphal: ArrayViewMut2<F>,
) {
    let mut ws = Workspace::new(abl.ncols());
    messages_forwards_log_with(trans, init, abl, alphal, &mut ws)
}

///
/// `messages_forwards_log` using the given scratch buffers.
///
pub fn messages_forwards_log_with<F: HmmFloat>(
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    mut alphal: ArrayViewMut2<F>,
    ws: &mut Workspace<F>,
) {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(trans.dim(), (n_states, n_states));
    debug_assert_eq!(init.len(), n_states);
    debug_assert_eq!(alphal.dim(), (n_steps, n_states));
    if n_steps == 0 {
        return;
    }
    let mut shifted = ws.scratch(n_states, 0).a;

    Zip::from(alphal.row_mut(0))
        .and(&init)
        .and(abl.row(0))
        .for_each(|x, &p, &a| *x = p.ln() + a);
    for t in 0..n_steps - 1 {
        let cmax = exp_shifted_into(alphal.row(t), shifted.view_mut());
        if !cmax.is_finite() {
            debug!("forward: zero probability at t={}", t);
            alphal.slice_mut(s![t + 1.., ..]).fill(F::neg_infinity());
            return;
        }
        let mut next = alphal.row_mut(t + 1);
        general_mat_vec_mul(F::one(), &trans.t(), &shifted, F::zero(), &mut next);
        Zip::from(&mut next)
            .and(abl.row(t + 1))
            .for_each(|x, &a| *x = x.ln() + cmax + a);
    }
}

///
/// Run Forward algorithm in normalized space and fill `alphan` (T x M).
/// Returns the total log likelihood `log P(x[0:T])`.
///
/// ```text
/// in[0]       = pi0
/// u[t]        = in[t] * exp(aBl[t] - cmax[t])
/// alphan[t]   = u[t] / sum(u[t])
/// in[t+1]     = alphan[t] . A
/// logtot      = \sum_t log(sum(u[t])) + cmax[t]
/// ```
///
/// If some `sum(u[t])` is zero the sequence is impossible: rows `t..T` are
/// zeroed and `-inf` is returned.
///
pub fn messages_forwards_normalized<F: HmmFloat>(
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    alphan: ArrayViewMut2<F>,
) -> F {
    let mut ws = Workspace::new(abl.ncols());
    messages_forwards_normalized_with(trans, init, abl, alphan, &mut ws)
}

///
/// `messages_forwards_normalized` using the given scratch buffers.
///
pub fn messages_forwards_normalized_with<F: HmmFloat>(
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    mut alphan: ArrayViewMut2<F>,
    ws: &mut Workspace<F>,
) -> F {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(trans.dim(), (n_states, n_states));
    debug_assert_eq!(init.len(), n_states);
    debug_assert_eq!(alphan.dim(), (n_steps, n_states));
    let mut in_potential = ws.scratch(n_states, 0).a;
    in_potential.assign(&init);

    let mut logtot = F::zero();
    for t in 0..n_steps {
        let mut row = alphan.row_mut(t);
        let cmax = exp_shifted_into(abl.row(t), row.view_mut());
        row *= &in_potential;
        let norm = row.sum();
        if norm == F::zero() {
            debug!("forward (normalized): zero probability at t={}", t);
            alphan.slice_mut(s![t.., ..]).fill(F::zero());
            return F::neg_infinity();
        }
        row /= norm;
        logtot += norm.ln() + cmax;
        general_mat_vec_mul(F::one(), &trans.t(), &row, F::zero(), &mut in_potential);
    }
    logtot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::mock_weather;
    use crate::prob::logsumexp;
    use ndarray::{array, Array2};

    #[test]
    fn hmm_forward_first_row() {
        let (trans, init, abl) = mock_weather();
        let mut alphal = Array2::zeros(abl.dim());
        messages_forwards_log(trans.view(), init.view(), abl.view(), alphal.view_mut());
        for i in 0..2 {
            assert_abs_diff_eq!(alphal[[0, i]], init[i].ln() + abl[[0, i]]);
        }
    }
    #[test]
    fn hmm_forward_two_steps_by_hand() {
        let (trans, init, abl) = mock_weather();
        let abl = abl.slice(s![..2, ..]);
        let mut alphal = Array2::zeros(abl.dim());
        messages_forwards_log(trans.view(), init.view(), abl, alphal.view_mut());
        for j in 0..2 {
            let expected: f64 = (0..2)
                .map(|i| init[i] * abl[[0, i]].exp() * trans[[i, j]])
                .sum::<f64>()
                .ln()
                + abl[[1, j]];
            assert_abs_diff_eq!(alphal[[1, j]], expected, epsilon = 1e-12);
        }
    }
    #[test]
    fn hmm_forward_log_and_normalized_agree() {
        let (trans, init, abl) = mock_weather();
        let mut alphal = Array2::zeros(abl.dim());
        let mut alphan = Array2::zeros(abl.dim());
        messages_forwards_log(trans.view(), init.view(), abl.view(), alphal.view_mut());
        let logtot = messages_forwards_normalized(
            trans.view(),
            init.view(),
            abl.view(),
            alphan.view_mut(),
        );
        let last = alphal.nrows() - 1;
        assert_abs_diff_eq!(logsumexp(alphal.row(last)), logtot, epsilon = 1e-10);
        for row in alphan.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
        // alphan is alphal normalized per row
        for t in 0..alphal.nrows() {
            let lse = logsumexp(alphal.row(t));
            for i in 0..2 {
                assert_abs_diff_eq!(alphan[[t, i]], (alphal[[t, i]] - lse).exp(), epsilon = 1e-10);
            }
        }
    }
    #[test]
    fn hmm_forward_dead_sequence() {
        let (trans, init, mut abl) = mock_weather();
        abl.row_mut(2).fill(f64::NEG_INFINITY);

        let mut alphal = Array2::zeros(abl.dim());
        messages_forwards_log(trans.view(), init.view(), abl.view(), alphal.view_mut());
        for t in 2..abl.nrows() {
            assert!(alphal.row(t).iter().all(|&x| x == f64::NEG_INFINITY));
        }
        assert!(alphal.row(1).iter().all(|x| x.is_finite()));

        let mut alphan = Array2::from_elem(abl.dim(), 0.5);
        let logtot = messages_forwards_normalized(
            trans.view(),
            init.view(),
            abl.view(),
            alphan.view_mut(),
        );
        assert_eq!(logtot, f64::NEG_INFINITY);
        for t in 2..abl.nrows() {
            assert!(alphan.row(t).iter().all(|&x| x == 0.0));
        }
        assert_abs_diff_eq!(alphan.row(1).sum(), 1.0, epsilon = 1e-12);
    }
    #[test]
    fn hmm_forward_impossible_start() {
        // state 1 is never initial, and only state 1 can emit x[0]
        let trans = array![[0.5, 0.5], [0.5, 0.5]];
        let init = array![1.0, 0.0];
        let abl = array![[f64::NEG_INFINITY, 0.0], [0.0, 0.0]];
        let mut alphan = Array2::zeros((2, 2));
        let logtot = messages_forwards_normalized(
            trans.view(),
            init.view(),
            abl.view(),
            alphan.view_mut(),
        );
        assert_eq!(logtot, f64::NEG_INFINITY);
        assert!(alphan.iter().all(|&x| x == 0.0));
    }
    #[test]
    fn hmm_forward_f32() {
        let (trans, init, abl) = mock_weather();
        let trans = trans.mapv(|x| x as f32);
        let init = init.mapv(|x| x as f32);
        let abl32 = abl.mapv(|x| x as f32);
        let mut alphan = Array2::<f32>::zeros(abl32.dim());
        let l32 = messages_forwards_normalized(
            trans.view(),
            init.view(),
            abl32.view(),
            alphan.view_mut(),
        );
        let (trans, init, _) = mock_weather();
        let mut alphan = Array2::<f64>::zeros(abl.dim());
        let l64 = messages_forwards_normalized(
            trans.view(),
            init.view(),
            abl.view(),
            alphan.view_mut(),
        );
        assert_abs_diff_eq!(l32 as f64, l64, epsilon = 1e-4);
    }
}
