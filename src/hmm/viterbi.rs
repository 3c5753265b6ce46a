//!
//! Viterbi decoding
//!
use crate::error::HmmError;
use crate::float::{HmmFloat, StateIndex};
use crate::prob::argmax;
use crate::workspace::Workspace;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip};

///
/// Write the most probable state sequence into `stateseq` and return its
/// log joint probability `log P(x, z*)`.
///
/// Backward dynamic program over log scores:
///
/// ```text
/// score[T-1][i] = 0
/// score[t][i]   = max_j  log A[i,j] + score[t+1][j] + aBl[t+1][j]
/// arg[t+1][i]   = argmax_j (same)
/// z[0]          = argmax_i score[0][i] + log pi0[i] + aBl[0][i]
/// z[t]          = arg[t][z[t-1]]
/// ```
///
/// Ties resolve to the lowest state index, both in the backpointers and in
/// the choice of `z[0]`. If every path has zero probability the score is
/// `-inf`, and the path starts with state 0 up to the first impossible step.
///
pub fn viterbi<F: HmmFloat, I: StateIndex>(
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    stateseq: ArrayViewMut1<I>,
) -> Result<F, HmmError> {
    let mut ws = Workspace::new(abl.ncols());
    viterbi_with(trans, init, abl, stateseq, &mut ws)
}

///
/// `viterbi` using the given scratch buffers. The `T x M` backpointer table
/// and the `M x M` log transition matrix are still allocated per call.
///
pub fn viterbi_with<F: HmmFloat, I: StateIndex>(
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    mut stateseq: ArrayViewMut1<I>,
    ws: &mut Workspace<F>,
) -> Result<F, HmmError> {
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(trans.dim(), (n_states, n_states));
    debug_assert_eq!(init.len(), n_states);
    debug_assert_eq!(stateseq.len(), n_steps);
    if n_steps == 0 {
        return Ok(F::zero());
    }
    let sc = ws.scratch(n_states, 0);
    let (mut scores, mut prevscores, mut tempvec) = (sc.a, sc.b, sc.c);

    let log_trans = trans.mapv(|x| x.ln());
    let mut args = Array2::<usize>::zeros((n_steps, n_states));

    scores.fill(F::zero());
    for t in (0..n_steps - 1).rev() {
        for i in 0..n_states {
            Zip::from(&mut tempvec)
                .and(log_trans.row(i))
                .and(&scores)
                .and(abl.row(t + 1))
                .for_each(|x, &la, &s, &a| *x = la + s + a);
            let (j, best) = argmax(tempvec.view());
            prevscores[i] = best;
            args[[t + 1, i]] = j;
        }
        std::mem::swap(&mut scores, &mut prevscores);
    }

    Zip::from(&mut tempvec)
        .and(&scores)
        .and(&init)
        .and(abl.row(0))
        .for_each(|x, &s, &p, &a| *x = s + p.ln() + a);
    let (mut k, best) = argmax(tempvec.view());
    stateseq[0] = I::from_state(k)?;
    for t in 1..n_steps {
        k = args[[t, k]];
        stateseq[t] = I::from_state(k)?;
    }
    Ok(best)
}
