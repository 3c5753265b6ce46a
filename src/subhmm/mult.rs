//!
//! Multiplication by the implicit block-factored transition matrix
//!
//! Right multiply (used by backward messages)
//!
//! ```text
//! incoming[c] = init_c . v_c                       (B)
//! through[b]  = \sum_c Super[b,c] incoming[c]      (B)
//! out_b       = (1 - ps_b) * (S_b v_b) + ps_b * through[b]
//! ```
//!
//! Left multiply (used by forward messages)
//!
//! ```text
//! exits[b]    = \sum_{k in b} v[k] ps[k]           (B)
//! entering[c] = \sum_b exits[b] Super[b,c]         (B)
//! out_c       = ((1 - ps_c) * v_c) S_c + entering[c] init_c
//! ```
//!
//! Both cost `O(\sum_b Nsubs[b]^2 + B^2)` instead of `O(N^2)`.
//!
use super::common::SubHmm;
use crate::float::HmmFloat;
use crate::workspace::Workspace;
use ndarray::linalg::general_mat_vec_mul;
use ndarray::{s, ArrayView1, ArrayViewMut1, Zip};

///
/// `out = A v`. Returns `sum(out)`.
///
pub fn fast_mult<F: HmmFloat>(model: &SubHmm<F>, v: ArrayView1<F>, out: ArrayViewMut1<F>) -> F {
    let mut ws = Workspace::with_blocks(0, model.n_blocks());
    fast_mult_with(model, v, out, &mut ws)
}

///
/// `fast_mult` using the given scratch buffers.
///
pub fn fast_mult_with<F: HmmFloat>(
    model: &SubHmm<F>,
    v: ArrayView1<F>,
    out: ArrayViewMut1<F>,
    ws: &mut Workspace<F>,
) -> F {
    let sc = ws.scratch(0, model.n_blocks());
    fast_mult_into(model, v, out, sc.block_a, sc.block_b)
}

///
/// `out = v A`. Returns `sum(out)`.
///
pub fn fast_left_mult<F: HmmFloat>(
    model: &SubHmm<F>,
    v: ArrayView1<F>,
    out: ArrayViewMut1<F>,
) -> F {
    let mut ws = Workspace::with_blocks(0, model.n_blocks());
    fast_left_mult_with(model, v, out, &mut ws)
}

///
/// `fast_left_mult` using the given scratch buffers.
///
pub fn fast_left_mult_with<F: HmmFloat>(
    model: &SubHmm<F>,
    v: ArrayView1<F>,
    out: ArrayViewMut1<F>,
    ws: &mut Workspace<F>,
) -> F {
    let sc = ws.scratch(0, model.n_blocks());
    fast_left_mult_into(model, v, out, sc.block_a, sc.block_b)
}

///
/// `A v` with two caller-provided `B`-length buffers.
///
pub(crate) fn fast_mult_into<F: HmmFloat>(
    model: &SubHmm<F>,
    v: ArrayView1<F>,
    mut out: ArrayViewMut1<F>,
    mut incoming: ArrayViewMut1<F>,
    mut through: ArrayViewMut1<F>,
) -> F {
    let n_blocks = model.n_blocks();
    debug_assert_eq!(v.len(), model.n_states());
    debug_assert_eq!(out.len(), model.n_states());
    debug_assert_eq!(incoming.len(), n_blocks);
    debug_assert_eq!(through.len(), n_blocks);

    for c in 0..n_blocks {
        incoming[c] = model.sub_init(c).dot(&v.slice(s![model.block_range(c)]));
    }
    general_mat_vec_mul(
        F::one(),
        &model.super_trans(),
        &incoming,
        F::zero(),
        &mut through,
    );

    let ps = model.ps();
    for b in 0..n_blocks {
        let range = model.block_range(b);
        let mut out_b = out.slice_mut(s![range.clone()]);
        general_mat_vec_mul(
            F::one(),
            &model.sub_trans(b),
            &v.slice(s![range.clone()]),
            F::zero(),
            &mut out_b,
        );
        let exit = through[b];
        Zip::from(&mut out_b)
            .and(ps.slice(s![range]))
            .for_each(|o, &p| *o = (F::one() - p) * *o + p * exit);
    }
    out.sum()
}

///
/// `v A` with two caller-provided `B`-length buffers.
///
pub(crate) fn fast_left_mult_into<F: HmmFloat>(
    model: &SubHmm<F>,
    v: ArrayView1<F>,
    mut out: ArrayViewMut1<F>,
    mut exits: ArrayViewMut1<F>,
    mut entering: ArrayViewMut1<F>,
) -> F {
    let n_blocks = model.n_blocks();
    debug_assert_eq!(v.len(), model.n_states());
    debug_assert_eq!(out.len(), model.n_states());
    debug_assert_eq!(exits.len(), n_blocks);
    debug_assert_eq!(entering.len(), n_blocks);

    let ps = model.ps();
    for b in 0..n_blocks {
        let range = model.block_range(b);
        exits[b] = v.slice(s![range.clone()]).dot(&ps.slice(s![range]));
    }
    general_mat_vec_mul(
        F::one(),
        &model.super_trans().t(),
        &exits,
        F::zero(),
        &mut entering,
    );

    for c in 0..n_blocks {
        let range = model.block_range(c);
        let start = range.start;
        let mut out_c = out.slice_mut(s![range.clone()]);
        let e = entering[c];
        Zip::from(&mut out_c)
            .and(&model.sub_init(c))
            .for_each(|o, &p| *o = e * p);
        let sub_trans = model.sub_trans(c);
        for k in range {
            let w = v[k] * (F::one() - ps[k]);
            if w != F::zero() {
                out_c.scaled_add(w, &sub_trans.row(k - start));
            }
        }
    }
    out.sum()
}
