//!
//! Sampling state sequences from the posterior (and the prior)
//!
//! * `sample_forwards_log`: forward sweep using backward log messages
//! * `sample_backwards_normalized`: forward-filter backward-sample using
//!   normalized forward messages
//! * `sample_prior`: Markov chain path without observations
//!
use crate::error::HmmError;
use crate::float::{HmmFloat, StateIndex};
use crate::picker::sample_discrete;
use crate::prob::exp_shifted_inplace;
use crate::workspace::Workspace;
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, Zip};
use rand::prelude::*;

///
/// Sample `stateseq` from `P(z | x)` sweeping forward in time.
///
/// ```text
/// d[0]     = pi0
/// z[t]     ~ d[t] * exp(betal[t] + aBl[t] - max)
/// d[t+1]   = A[z[t], :]
/// ```
///
/// `betal` must be the output of `messages_backwards_log` for the same model
/// and emissions.
///
pub fn sample_forwards_log<F, I, R>(
    rng: &mut R,
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    betal: ArrayView2<F>,
    stateseq: ArrayViewMut1<I>,
) -> Result<(), HmmError>
where
    F: HmmFloat,
    I: StateIndex,
    R: Rng + ?Sized,
{
    let mut ws = Workspace::new(abl.ncols());
    sample_forwards_log_with(rng, trans, init, abl, betal, stateseq, &mut ws)
}

///
/// `sample_forwards_log` using the given scratch buffers.
///
pub fn sample_forwards_log_with<F, I, R>(
    rng: &mut R,
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    abl: ArrayView2<F>,
    betal: ArrayView2<F>,
    mut stateseq: ArrayViewMut1<I>,
    ws: &mut Workspace<F>,
) -> Result<(), HmmError>
where
    F: HmmFloat,
    I: StateIndex,
    R: Rng + ?Sized,
{
    let (n_steps, n_states) = abl.dim();
    debug_assert_eq!(trans.dim(), (n_states, n_states));
    debug_assert_eq!(betal.dim(), (n_steps, n_states));
    debug_assert_eq!(stateseq.len(), n_steps);
    let sc = ws.scratch(n_states, 0);
    let (mut logdomain, mut nextstate_distr) = (sc.a, sc.b);

    nextstate_distr.assign(&init);
    for t in 0..n_steps {
        Zip::from(&mut logdomain)
            .and(betal.row(t))
            .and(abl.row(t))
            .for_each(|l, &b, &a| *l = b + a);
        exp_shifted_inplace(logdomain.view_mut());
        nextstate_distr *= &logdomain;
        let k = sample_discrete(rng, nextstate_distr.view())?;
        stateseq[t] = I::from_state(k)?;
        nextstate_distr.assign(&trans.row(k));
    }
    Ok(())
}

///
/// Sample `stateseq` from `P(z | x)` sweeping backward in time.
///
/// ```text
/// z[T-1] ~ alphan[T-1]
/// z[t]   ~ AT[z[t+1], :] * alphan[t]
/// ```
///
/// `trans_t` is the transpose of the transition matrix and `alphan` the
/// output of `messages_forwards_normalized`.
///
pub fn sample_backwards_normalized<F, I, R>(
    rng: &mut R,
    trans_t: ArrayView2<F>,
    alphan: ArrayView2<F>,
    stateseq: ArrayViewMut1<I>,
) -> Result<(), HmmError>
where
    F: HmmFloat,
    I: StateIndex,
    R: Rng + ?Sized,
{
    let mut ws = Workspace::new(alphan.ncols());
    sample_backwards_normalized_with(rng, trans_t, alphan, stateseq, &mut ws)
}

///
/// `sample_backwards_normalized` using the given scratch buffers.
///
pub fn sample_backwards_normalized_with<F, I, R>(
    rng: &mut R,
    trans_t: ArrayView2<F>,
    alphan: ArrayView2<F>,
    mut stateseq: ArrayViewMut1<I>,
    ws: &mut Workspace<F>,
) -> Result<(), HmmError>
where
    F: HmmFloat,
    I: StateIndex,
    R: Rng + ?Sized,
{
    let (n_steps, n_states) = alphan.dim();
    debug_assert_eq!(trans_t.dim(), (n_states, n_states));
    debug_assert_eq!(stateseq.len(), n_steps);
    if n_steps == 0 {
        return Ok(());
    }
    let mut temp = ws.scratch(n_states, 0).a;

    let mut k = sample_discrete(rng, alphan.row(n_steps - 1))?;
    stateseq[n_steps - 1] = I::from_state(k)?;
    for t in (0..n_steps - 1).rev() {
        Zip::from(&mut temp)
            .and(trans_t.row(k))
            .and(alphan.row(t))
            .for_each(|x, &a, &f| *x = a * f);
        k = sample_discrete(rng, temp.view())?;
        stateseq[t] = I::from_state(k)?;
    }
    Ok(())
}

///
/// Sample a path of the Markov chain `(A, pi0)` ignoring observations.
///
pub fn sample_prior<F, I, R>(
    rng: &mut R,
    trans: ArrayView2<F>,
    init: ArrayView1<F>,
    mut stateseq: ArrayViewMut1<I>,
) -> Result<(), HmmError>
where
    F: HmmFloat,
    I: StateIndex,
    R: Rng + ?Sized,
{
    let mut distr = init.view();
    for t in 0..stateseq.len() {
        let k = sample_discrete(rng, distr)?;
        stateseq[t] = I::from_state(k)?;
        distr = trans.row(k);
    }
    Ok(())
}
