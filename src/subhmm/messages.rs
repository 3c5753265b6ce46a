//!
//! Normalized forward and backward messages of a sub-HMM
//!
//! Same recursions as the flat normalized forward pass, with every product
//! against the transition matrix replaced by `fast_left_mult` (forward) or
//! `fast_mult` (backward).
//!
use super::common::SubHmm;
use super::mult::{fast_left_mult_into, fast_mult_into};
use crate::float::HmmFloat;
use crate::prob::exp_shifted_into;
use crate::workspace::Workspace;
use log::debug;
use ndarray::{s, ArrayView2, ArrayViewMut2};

///
/// Normalized forward messages
///
/// ```text
/// in[0]       = pi
/// alphan[t]   = in[t] * exp(aBl[t] - cmax[t]) / norm[t]
/// in[t+1]     = alphan[t] A
/// logtot      = \sum_t log(norm[t]) + cmax[t]
/// ```
///
/// Writes `alphan` (T x N) and returns `log P(x)`. If some `norm[t]` is zero
/// the rows `t..T` are zeroed and `-inf` is returned.
///
pub fn messages_forwards_normalized<F: HmmFloat>(
    model: &SubHmm<F>,
    abl: ArrayView2<F>,
    alphan: ArrayViewMut2<F>,
) -> F {
    let mut ws = Workspace::with_blocks(model.n_states(), model.n_blocks());
    messages_forwards_normalized_with(model, abl, alphan, &mut ws)
}

///
/// `messages_forwards_normalized` using the given scratch buffers.
///
pub fn messages_forwards_normalized_with<F: HmmFloat>(
    model: &SubHmm<F>,
    abl: ArrayView2<F>,
    mut alphan: ArrayViewMut2<F>,
    ws: &mut Workspace<F>,
) -> F {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(n_states, model.n_states());
    debug_assert_eq!(alphan.dim(), abl.dim());
    let sc = ws.scratch(n_states, model.n_blocks());
    let (mut in_potential, mut block_a, mut block_b) = (sc.a, sc.block_a, sc.block_b);

    model.init_distn_into(in_potential.view_mut());
    let mut logtot = F::zero();
    for t in 0..n_steps {
        let mut row = alphan.row_mut(t);
        let cmax = exp_shifted_into(abl.row(t), row.view_mut());
        row *= &in_potential;
        let norm = row.sum();
        if norm == F::zero() {
            debug!("dead sequence in sub-HMM forward messages at t={}", t);
            alphan.slice_mut(s![t.., ..]).fill(F::zero());
            return F::neg_infinity();
        }
        row /= norm;
        logtot += norm.ln() + cmax;

        if t + 1 < n_steps {
            fast_left_mult_into(
                model,
                alphan.row(t),
                in_potential.view_mut(),
                block_a.view_mut(),
                block_b.view_mut(),
            );
        }
    }
    logtot
}

///
/// Normalized backward messages
///
/// ```text
/// betan[T-1] = 1
/// betan[t]   = A (betan[t+1] * exp(aBl[t+1] - cmax[t+1])) / norm[t]
/// logtot     = \sum_t log(norm[t]) + cmax[t+1]
///            + log(\sum_k pi[k] exp(aBl[0][k] - cmax[0]) betan[0][k]) + cmax[0]
/// ```
///
/// Writes `betan` (T x N) and returns `log P(x)`, including the initial
/// step so that it agrees with the forward pass. If some `norm[t]` is zero
/// the rows `0..=t` are zeroed and `-inf` is returned.
///
pub fn messages_backwards_normalized<F: HmmFloat>(
    model: &SubHmm<F>,
    abl: ArrayView2<F>,
    betan: ArrayViewMut2<F>,
) -> F {
    let mut ws = Workspace::with_blocks(model.n_states(), model.n_blocks());
    messages_backwards_normalized_with(model, abl, betan, &mut ws)
}

///
/// `messages_backwards_normalized` using the given scratch buffers.
///
pub fn messages_backwards_normalized_with<F: HmmFloat>(
    model: &SubHmm<F>,
    abl: ArrayView2<F>,
    mut betan: ArrayViewMut2<F>,
    ws: &mut Workspace<F>,
) -> F {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(n_states, model.n_states());
    debug_assert_eq!(betan.dim(), abl.dim());
    if n_steps == 0 {
        return F::zero();
    }
    let sc = ws.scratch(n_states, model.n_blocks());
    let (mut temp, mut init, mut block_a, mut block_b) = (sc.a, sc.b, sc.block_a, sc.block_b);

    betan.row_mut(n_steps - 1).fill(F::one());
    let mut logtot = F::zero();
    for t in (0..n_steps - 1).rev() {
        let cmax = exp_shifted_into(abl.row(t + 1), temp.view_mut());
        temp *= &betan.row(t + 1);
        let norm = fast_mult_into(
            model,
            temp.view(),
            betan.row_mut(t),
            block_a.view_mut(),
            block_b.view_mut(),
        );
        if norm == F::zero() {
            debug!("dead sequence in sub-HMM backward messages at t={}", t + 1);
            betan.slice_mut(s![..=t, ..]).fill(F::zero());
            return F::neg_infinity();
        }
        let mut row = betan.row_mut(t);
        row /= norm;
        logtot += norm.ln() + cmax;
    }

    model.init_distn_into(init.view_mut());
    let cmax = exp_shifted_into(abl.row(0), temp.view_mut());
    temp *= &init;
    temp *= &betan.row(0);
    logtot + temp.sum().ln() + cmax
}
