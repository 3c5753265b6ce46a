//!
//! Block descriptor of a sub-HMM and its checked entry points
//!
use super::messages::{messages_backwards_normalized_with, messages_forwards_normalized_with};
use super::sample::sample_backwards_normalized;
use super::sparse::CsrMatrix;
use crate::error::HmmError;
use crate::float::{HmmFloat, StateIndex};
use crate::hmm::common::{
    check_dim, check_distribution, check_emissions, check_no_nan, check_scalar, check_stochastic,
};
use crate::workspace::Workspace;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip};
use rand::prelude::*;
use std::ops::Range;

///
/// Borrowed parameters of a sub-HMM with `B` blocks and `N` sub-states.
///
/// * `super_trans` (B x B) and `super_init` (B): chain over blocks
/// * `sub_transs[b]` (Nsubs[b] x Nsubs[b]) and `sub_inits[b]` (Nsubs[b]): chain inside block `b`
/// * `rs` (N): owning block of each sub-state
/// * `ps` (N): probability of leaving through the super-level chain
///
/// Blocks are contiguous: block `b` occupies `blockstarts[b]..blockstarts[b] + blocksizes[b]`.
///
#[derive(Debug, Clone)]
pub struct SubHmm<'a, F> {
    super_trans: ArrayView2<'a, F>,
    super_init: ArrayView1<'a, F>,
    sub_transs: Vec<ArrayView2<'a, F>>,
    sub_inits: Vec<ArrayView1<'a, F>>,
    rs: Vec<usize>,
    ps: ArrayView1<'a, F>,
    blockstarts: Vec<usize>,
    blocksizes: Vec<usize>,
}

impl<'a, F: HmmFloat> SubHmm<'a, F> {
    ///
    /// Validate every part of the factored model.
    ///
    /// `nsubs` gives the block sizes and `rs` must agree with the contiguous
    /// layout they imply.
    ///
    pub fn new<I: StateIndex>(
        nsubs: &[I],
        rs: &[I],
        ps: ArrayView1<'a, F>,
        super_trans: ArrayView2<'a, F>,
        super_init: ArrayView1<'a, F>,
        sub_transs: Vec<ArrayView2<'a, F>>,
        sub_inits: Vec<ArrayView1<'a, F>>,
    ) -> Result<Self, HmmError> {
        let n_blocks = nsubs.len();
        if n_blocks == 0 {
            return Err(HmmError::InvalidStateCount(0));
        }
        let mut blockstarts = Vec::with_capacity(n_blocks);
        let mut blocksizes = Vec::with_capacity(n_blocks);
        let mut n_states = 0;
        for &n in nsubs {
            let n = n
                .to_state()
                .filter(|&n| n > 0)
                .ok_or(HmmError::InvalidStateCount(0))?;
            blockstarts.push(n_states);
            blocksizes.push(n);
            n_states += n;
        }

        check_dim("super transition matrix rows", n_blocks, super_trans.nrows())?;
        check_dim("super transition matrix columns", n_blocks, super_trans.ncols())?;
        check_dim("super initial distribution", n_blocks, super_init.len())?;
        check_stochastic(super_trans)?;
        check_distribution("super initial distribution", super_init)?;

        check_dim("sub transition matrices", n_blocks, sub_transs.len())?;
        check_dim("sub initial distributions", n_blocks, sub_inits.len())?;
        for (b, &n) in blocksizes.iter().enumerate() {
            check_dim("sub transition matrix rows", n, sub_transs[b].nrows())?;
            check_dim("sub transition matrix columns", n, sub_transs[b].ncols())?;
            check_dim("sub initial distribution", n, sub_inits[b].len())?;
            check_stochastic(sub_transs[b])?;
            check_distribution("sub initial distribution", sub_inits[b])?;
        }

        check_dim("block assignments", n_states, rs.len())?;
        let mut owners = Vec::with_capacity(n_states);
        for (b, (&start, &size)) in blockstarts.iter().zip(blocksizes.iter()).enumerate() {
            for state in start..start + size {
                match rs[state].to_state() {
                    Some(r) if r == b => owners.push(r),
                    other => {
                        return Err(HmmError::InvalidBlockIndex {
                            state,
                            block: other.unwrap_or(n_blocks),
                            n_blocks,
                        })
                    }
                }
            }
        }

        check_dim("exit weights", n_states, ps.len())?;
        for (index, &p) in ps.iter().enumerate() {
            if !(p >= F::zero() && p <= F::one()) {
                return Err(HmmError::InvalidProbability {
                    what: "exit weight",
                    index,
                    value: p.as_f64(),
                });
            }
        }

        Ok(SubHmm {
            super_trans,
            super_init,
            sub_transs,
            sub_inits,
            rs: owners,
            ps,
            blockstarts,
            blocksizes,
        })
    }
    /// Number of blocks `B`
    pub fn n_blocks(&self) -> usize {
        self.blocksizes.len()
    }
    /// Number of sub-states `N`
    pub fn n_states(&self) -> usize {
        self.rs.len()
    }
    /// Sub-states of block `b`
    pub fn block_range(&self, b: usize) -> Range<usize> {
        self.blockstarts[b]..self.blockstarts[b] + self.blocksizes[b]
    }
    pub fn blockstarts(&self) -> &[usize] {
        &self.blockstarts
    }
    pub fn blocksizes(&self) -> &[usize] {
        &self.blocksizes
    }
    pub fn rs(&self) -> &[usize] {
        &self.rs
    }
    pub fn ps(&self) -> ArrayView1<'a, F> {
        self.ps
    }
    pub fn super_trans(&self) -> ArrayView2<'a, F> {
        self.super_trans
    }
    pub fn super_init(&self) -> ArrayView1<'a, F> {
        self.super_init
    }
    pub fn sub_trans(&self, b: usize) -> ArrayView2<'a, F> {
        self.sub_transs[b]
    }
    pub fn sub_init(&self, b: usize) -> ArrayView1<'a, F> {
        self.sub_inits[b]
    }
    ///
    /// Write the initial distribution over sub-states
    ///
    /// ```text
    /// pi[k] = super_init[rs[k]] init_{rs[k]}[k~]
    /// ```
    ///
    pub fn init_distn_into(&self, mut out: ArrayViewMut1<F>) {
        debug_assert_eq!(out.len(), self.n_states());
        for b in 0..self.n_blocks() {
            let w = self.super_init[b];
            Zip::from(out.slice_mut(s![self.block_range(b)]))
                .and(&self.sub_inits[b])
                .for_each(|o, &p| *o = w * p);
        }
    }
    ///
    /// Allocating version of `init_distn_into`.
    ///
    pub fn init_distn(&self) -> Array1<F> {
        let mut pi = Array1::zeros(self.n_states());
        self.init_distn_into(pi.view_mut());
        pi
    }
    ///
    /// Entry `A[k, l]` of the full transition matrix.
    ///
    pub fn transition(&self, k: usize, l: usize) -> F {
        let (b, c) = (self.rs[k], self.rs[l]);
        let (kt, lt) = (k - self.blockstarts[b], l - self.blockstarts[c]);
        let exit = self.ps[k] * self.super_trans[[b, c]] * self.sub_inits[c][lt];
        if b == c {
            exit + (F::one() - self.ps[k]) * self.sub_transs[b][[kt, lt]]
        } else {
            exit
        }
    }
    ///
    /// Materialize the `N x N` transition matrix. Meant for small models and tests.
    ///
    pub fn to_dense(&self) -> Array2<F> {
        let n = self.n_states();
        Array2::from_shape_fn((n, n), |(k, l)| self.transition(k, l))
    }
    ///
    /// Compressed rows of `A^T` (row `l` lists the predecessors `k` with `A[k, l] > 0`),
    /// the input of `sample_backwards_normalized`.
    ///
    pub fn to_sparse_transpose(&self) -> CsrMatrix<F> {
        let n = self.n_states();
        CsrMatrix::from_rows(
            n,
            (0..n).map(move |l| {
                (0..n)
                    .map(move |k| (k, self.transition(k, l)))
                    .filter(|&(_, a)| a != F::zero())
            }),
        )
    }

    //
    // checked entry points
    //

    ///
    /// Check that `abl` is `T x N` with `T >= 1` and has no NaN. Returns `T`.
    ///
    pub fn check_emissions(&self, abl: ArrayView2<F>) -> Result<usize, HmmError> {
        check_emissions(abl, self.n_states())
    }
    ///
    /// Normalized forward messages `alphan` (T x N) and `log P(x)`
    ///
    pub fn messages_forwards_normalized(
        &self,
        abl: ArrayView2<F>,
    ) -> Result<(Array2<F>, F), HmmError> {
        self.check_emissions(abl)?;
        let mut ws = Workspace::with_blocks(self.n_states(), self.n_blocks());
        let mut alphan = Array2::zeros(abl.dim());
        let logtot = messages_forwards_normalized_with(self, abl, alphan.view_mut(), &mut ws);
        Ok((alphan, check_scalar("log likelihood", logtot)?))
    }
    ///
    /// Normalized backward messages `betan` (T x N) and `log P(x)`
    ///
    pub fn messages_backwards_normalized(
        &self,
        abl: ArrayView2<F>,
    ) -> Result<(Array2<F>, F), HmmError> {
        self.check_emissions(abl)?;
        let mut ws = Workspace::with_blocks(self.n_states(), self.n_blocks());
        let mut betan = Array2::zeros(abl.dim());
        let logtot = messages_backwards_normalized_with(self, abl, betan.view_mut(), &mut ws);
        check_no_nan("backward messages", betan.view())?;
        Ok((betan, check_scalar("log likelihood", logtot)?))
    }
    ///
    /// `log P(x)`; `-inf` if the observations are impossible under the model.
    ///
    pub fn log_likelihood(&self, abl: ArrayView2<F>) -> Result<F, HmmError> {
        self.messages_forwards_normalized(abl).map(|(_, logtot)| logtot)
    }
    ///
    /// Smoothed posteriors `P(z[t] = k | x)` (T x N), from the product of the
    /// normalized forward and backward messages. Rows of a dead sequence are zero.
    ///
    pub fn expectations(&self, abl: ArrayView2<F>) -> Result<Array2<F>, HmmError> {
        let (mut gamma, _) = self.messages_forwards_normalized(abl)?;
        let (betan, _) = self.messages_backwards_normalized(abl)?;
        gamma *= &betan;
        for mut row in gamma.rows_mut() {
            let norm = row.sum();
            if norm > F::zero() {
                row /= norm;
            }
        }
        Ok(gamma)
    }
    ///
    /// Posterior sample of the sub-state sequence by forward-filter
    /// backward-sample over the compressed `A^T`.
    ///
    pub fn sample_states<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        abl: ArrayView2<F>,
    ) -> Result<Array1<usize>, HmmError> {
        let (alphan, _) = self.messages_forwards_normalized(abl)?;
        let trans_t = self.to_sparse_transpose();
        let mut stateseq = Array1::zeros(alphan.nrows());
        sample_backwards_normalized(rng, alphan.view(), &trans_t.view(), stateseq.view_mut())?;
        Ok(stateseq)
    }
}
