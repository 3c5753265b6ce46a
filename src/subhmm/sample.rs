//!
//! Backward sampling over a compressed-row transition structure
//!
use super::sparse::CsrView;
use crate::error::HmmError;
use crate::float::{HmmFloat, StateIndex};
use crate::picker::{sample_discrete, sample_discrete_iter};
use ndarray::{ArrayView2, ArrayViewMut1};
use rand::prelude::*;

///
/// Forward-filter backward-sample restricted to the stored entries of `A^T`.
///
/// ```text
/// z[T-1] ~ alphan[T-1]
/// z[t]   ~ { k : AT[z[t+1], k] * alphan[t][k] }   for the stored k of row z[t+1]
/// ```
///
/// `trans_t` is the CSR of the transpose of the full transition matrix
/// (row `l` lists the predecessors `k` with weight `A[k, l]`), e.g.
/// `SubHmm::to_sparse_transpose` or `CsrMatrix::from_dense_transpose`.
/// `alphan` is any normalized forward message matrix over the same states.
///
pub fn sample_backwards_normalized<F, I, J, R>(
    rng: &mut R,
    alphan: ArrayView2<F>,
    trans_t: &CsrView<F, J>,
    mut stateseq: ArrayViewMut1<I>,
) -> Result<(), HmmError>
where
    F: HmmFloat,
    I: StateIndex,
    J: StateIndex,
    R: Rng + ?Sized,
{
    let (n_steps, n_states) = alphan.dim();
    debug_assert_eq!(trans_t.n_rows(), n_states);
    debug_assert_eq!(trans_t.n_cols(), n_states);
    debug_assert_eq!(stateseq.len(), n_steps);
    if n_steps == 0 {
        return Ok(());
    }

    let mut k = sample_discrete(rng, alphan.row(n_steps - 1))?;
    stateseq[n_steps - 1] = I::from_state(k)?;
    for t in (0..n_steps - 1).rev() {
        let filtered = alphan.row(t);
        let entries = trans_t.row_range(k);
        let pos = sample_discrete_iter(
            rng,
            entries
                .clone()
                .map(|p| trans_t.value(p) * filtered[trans_t.index(p)]),
        )?;
        k = trans_t.index(entries.start + pos);
        stateseq[t] = I::from_state(k)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm;
    use crate::subhmm::sparse::CsrMatrix;
    use ndarray::{array, Array1, Array2};
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn sparse_sample_follows_only_stored_transitions() {
        // a cycle 0 -> 1 -> 2 -> 0
        let trans = array![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let init = array![1.0, 0.0, 0.0];
        let abl = Array2::zeros((7, 3));
        let mut alphan = Array2::zeros(abl.dim());
        hmm::messages_forwards_normalized(trans.view(), init.view(), abl.view(), alphan.view_mut());
        let trans_t = CsrMatrix::from_dense_transpose(trans.view());
        assert_eq!(trans_t.nnz(), 3);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mut seq = Array1::<i32>::zeros(7);
        sample_backwards_normalized(&mut rng, alphan.view(), &trans_t.view(), seq.view_mut())
            .unwrap();
        assert_eq!(seq, array![0, 1, 2, 0, 1, 2, 0]);
    }
    #[test]
    fn sparse_sample_matches_dense_sampler_in_distribution() {
        let trans = array![[0.7, 0.3], [0.4, 0.6]];
        let init = array![0.5, 0.5];
        let abl = array![[-0.1, -2.0], [-1.0, -0.5], [-0.3, -0.3]];
        let mut alphan = Array2::zeros(abl.dim());
        hmm::messages_forwards_normalized(trans.view(), init.view(), abl.view(), alphan.view_mut());
        let csr = CsrMatrix::from_dense_transpose(trans.view());
        let trans_t = trans.t().to_owned();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let n = 20000;
        let mut seq = Array1::<usize>::zeros(3);
        let (mut n_sparse, mut n_dense) = (0, 0);
        for _ in 0..n {
            sample_backwards_normalized(&mut rng, alphan.view(), &csr.view(), seq.view_mut())
                .unwrap();
            n_sparse += seq[0];
            hmm::sample_backwards_normalized(
                &mut rng,
                trans_t.view(),
                alphan.view(),
                seq.view_mut(),
            )
            .unwrap();
            n_dense += seq[0];
        }
        assert_abs_diff_eq!(
            n_sparse as f64 / n as f64,
            n_dense as f64 / n as f64,
            epsilon = 0.02
        );
    }
    #[test]
    fn sparse_sample_empty_row_is_zero_weights() {
        // state 1 has no predecessors, but the filter puts mass on it at the end
        let alphan = array![[1.0, 0.0], [0.0, 1.0]];
        let trans_t = CsrMatrix::from_dense_transpose(array![[1.0, 0.0], [1.0, 0.0]].view());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let mut seq = Array1::<usize>::zeros(2);
        let r = sample_backwards_normalized(&mut rng, alphan.view(), &trans_t.view(), seq.view_mut());
        assert!(matches!(r, Err(HmmError::ZeroWeights)));
    }
}
