//!
//! Backward algorithm in log space
//!
use crate::float::HmmFloat;
use crate::prob::exp_shifted_inplace;
use crate::workspace::Workspace;
use log::debug;
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{s, ArrayView2, ArrayViewMut2, Zip};

///
/// Run Backward algorithm and fill `betal` (T x M).
///
/// ```text
/// betal[T-1][i] = 0
/// betal[t][i]   = log \sum_j A[i,j] exp(aBl[t+1][j] + betal[t+1][j])
///               = log (A . exp(s - cmax))[i] + cmax
///                 where s = aBl[t+1] + betal[t+1], cmax = max(s)
/// ```
///
/// If `s` is `-inf` everywhere, no state at `t` can explain the future
/// observations; rows `0..=t` are filled with `-inf`.
///
pub fn messages_backwards_log<F: HmmFloat>(
    trans: ArrayView2<F>,
    abl: ArrayView2<F>,
    betal: ArrayViewMut2<F>,
) {
    let mut ws = Workspace::new(abl.ncols());
    messages_backwards_log_with(trans, abl, betal, &mut ws)
}

///
/// `messages_backwards_log` using the given scratch buffers.
///
pub fn messages_backwards_log_with<F: HmmFloat>(
    trans: ArrayView2<F>,
    abl: ArrayView2<F>,
    mut betal: ArrayViewMut2<F>,
    ws: &mut Workspace<F>,
) {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(trans.dim(), (n_states, n_states));
    debug_assert_eq!(betal.dim(), (n_steps, n_states));
    if n_steps == 0 {
        return;
    }
    let mut thesum = ws.scratch(n_states, 0).a;

    betal.row_mut(n_steps - 1).fill(F::zero());
    for t in (0..n_steps - 1).rev() {
        Zip::from(&mut thesum)
            .and(abl.row(t + 1))
            .and(betal.row(t + 1))
            .for_each(|s, &a, &b| *s = a + b);
        let cmax = exp_shifted_inplace(thesum.view_mut());
        if !cmax.is_finite() {
            debug!("backward: zero probability after t={}", t + 1);
            betal.slice_mut(s![..=t, ..]).fill(F::neg_infinity());
            return;
        }
        let mut row = betal.row_mut(t);
        general_mat_vec_mul(F::one(), &trans, &thesum, F::zero(), &mut row);
        row.mapv_inplace(|x| x.ln() + cmax);
    }
}
