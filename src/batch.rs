//!
//! Parallel evaluation of many observation sequences under one model
//!
//! Sequences are independent, so each one is a rayon task. A task owns its
//! `Workspace` (one per rayon split via `map_init`) and, when sampling, its
//! own RNG seeded with `seed + index` so that the result does not depend on
//! how the work is scheduled.
//!
use crate::error::HmmError;
use crate::float::HmmFloat;
use crate::hmm::{self, Hmm};
use crate::subhmm::{self, SubHmm};
use crate::workspace::Workspace;
use log::info;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

///
/// Summed E-step statistics of a batch.
///
#[derive(Debug, Clone)]
pub struct BatchStats<F> {
    /// `\sum_x P(z[0] = i | x)`
    pub init_counts: Array1<F>,
    /// `\sum_x \sum_t P(z[t] = i, z[t+1] = j | x)`
    pub transcounts: Array2<F>,
    /// `\sum_x log P(x)`
    pub log_likelihood: F,
}

///
/// RNG of the `index`-th sequence of a batch seeded with `seed`.
///
pub fn sequence_rng(seed: u64, index: usize) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(index as u64))
}

///
/// `log P(x)` of every sequence.
///
pub fn log_likelihoods<F: HmmFloat>(
    model: &Hmm<F>,
    abls: &[Array2<F>],
) -> Result<Vec<F>, HmmError> {
    info!("log likelihood of {} sequences", abls.len());
    let n_states = model.n_states();
    abls.par_iter()
        .map_init(
            || Workspace::new(n_states),
            |ws, abl| {
                model.check_emissions(abl.view())?;
                let mut alphan = Array2::zeros(abl.dim());
                let logtot = hmm::messages_forwards_normalized_with(
                    model.trans(),
                    model.init(),
                    abl.view(),
                    alphan.view_mut(),
                    ws,
                );
                if logtot.is_nan() {
                    return Err(HmmError::NumericalError("log likelihood is NaN".to_owned()));
                }
                Ok(logtot)
            },
        )
        .collect()
}

///
/// `\sum_x log P(x)` over the batch.
///
pub fn total_log_likelihood<F: HmmFloat>(
    model: &Hmm<F>,
    abls: &[Array2<F>],
) -> Result<F, HmmError> {
    Ok(log_likelihoods(model, abls)?.into_iter().sum())
}

///
/// Viterbi path and its score for every sequence.
///
pub fn viterbi_paths<F: HmmFloat>(
    model: &Hmm<F>,
    abls: &[Array2<F>],
) -> Result<Vec<(Array1<usize>, F)>, HmmError> {
    info!("viterbi decoding of {} sequences", abls.len());
    abls.par_iter().map(|abl| model.viterbi(abl.view())).collect()
}

///
/// One posterior sample of the state path for every sequence.
///
pub fn sample_paths<F: HmmFloat>(
    model: &Hmm<F>,
    abls: &[Array2<F>],
    seed: u64,
) -> Result<Vec<Array1<usize>>, HmmError> {
    info!("sampling paths of {} sequences (seed={})", abls.len(), seed);
    abls.par_iter()
        .enumerate()
        .map(|(i, abl)| {
            let mut rng = sequence_rng(seed, i);
            model.sample_backwards(&mut rng, abl.view())
        })
        .collect()
}

///
/// Smoothed posteriors of every sequence.
///
pub fn posteriors<F: HmmFloat>(
    model: &Hmm<F>,
    abls: &[Array2<F>],
) -> Result<Vec<Array2<F>>, HmmError> {
    info!("posteriors of {} sequences", abls.len());
    abls.par_iter()
        .map(|abl| {
            model
                .expected_statistics(abl.view())
                .map(|stats| stats.expectations)
        })
        .collect()
}

///
/// E-step statistics summed over the batch.
///
pub fn expected_statistics<F: HmmFloat>(
    model: &Hmm<F>,
    abls: &[Array2<F>],
) -> Result<BatchStats<F>, HmmError> {
    info!("expected statistics of {} sequences", abls.len());
    let n_states = model.n_states();
    abls.par_iter()
        .map(|abl| {
            model.expected_statistics(abl.view()).map(|stats| BatchStats {
                init_counts: stats.expectations.row(0).to_owned(),
                transcounts: stats.transcounts,
                log_likelihood: stats.log_likelihood,
            })
        })
        .try_reduce(
            || BatchStats {
                init_counts: Array1::zeros(n_states),
                transcounts: Array2::zeros((n_states, n_states)),
                log_likelihood: F::zero(),
            },
            |mut a, b| {
                a.init_counts += &b.init_counts;
                a.transcounts += &b.transcounts;
                a.log_likelihood += b.log_likelihood;
                Ok(a)
            },
        )
}

///
/// `log P(x)` of every sequence under a sub-HMM.
///
pub fn subhmm_log_likelihoods<F: HmmFloat>(
    model: &SubHmm<F>,
    abls: &[Array2<F>],
) -> Result<Vec<F>, HmmError> {
    info!("sub-HMM log likelihood of {} sequences", abls.len());
    let (n_states, n_blocks) = (model.n_states(), model.n_blocks());
    abls.par_iter()
        .map_init(
            || Workspace::with_blocks(n_states, n_blocks),
            |ws, abl| {
                model.check_emissions(abl.view())?;
                let mut alphan = Array2::zeros(abl.dim());
                let logtot =
                    subhmm::messages_forwards_normalized_with(model, abl.view(), alphan.view_mut(), ws);
                if logtot.is_nan() {
                    return Err(HmmError::NumericalError("log likelihood is NaN".to_owned()));
                }
                Ok(logtot)
            },
        )
        .collect()
}

///
/// One posterior sample of the sub-state path for every sequence.
///
/// The compressed `A^T` is built once and shared by all tasks.
///
pub fn subhmm_sample_paths<F: HmmFloat>(
    model: &SubHmm<F>,
    abls: &[Array2<F>],
    seed: u64,
) -> Result<Vec<Array1<usize>>, HmmError> {
    info!(
        "sampling sub-HMM paths of {} sequences (seed={})",
        abls.len(),
        seed
    );
    let trans_t = model.to_sparse_transpose();
    let trans_t = trans_t.view();
    abls.par_iter()
        .enumerate()
        .map(|(i, abl)| {
            let (alphan, _) = model.messages_forwards_normalized(abl.view())?;
            let mut rng = sequence_rng(seed, i);
            let mut stateseq = Array1::zeros(alphan.nrows());
            subhmm::sample_backwards_normalized(
                &mut rng,
                alphan.view(),
                &trans_t,
                stateseq.view_mut(),
            )?;
            Ok(stateseq)
        })
        .collect()
}
