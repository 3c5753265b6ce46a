//!
//! Flat HMM message passing
//!
//! # Overview of calculation
//!
//! Model: `A` (M x M, row stochastic), `pi0` (M), and per-step emission log
//! likelihoods `aBl[t, i] = log p(x[t] | z[t] = i)` for `0 <= t < T`.
//!
//! Backward (log)
//! betal[t][i]
//!  = log P(emits x[t+1:T] | z[t] = i)
//!  (betal[T-1] = 0)
//!
//! Forward (log)
//! alphal[t][i]
//!  = log P(emits x[0:t+1] and z[t] = i)
//!
//! Forward (normalized)
//! alphan[t][i]
//!  = P(z[t] = i | x[0:t+1])
//!  with `logtot = log P(x[0:T])` accumulated from the per-step normalizers.
//!
//! Rows are shifted by their max before `exp`, so products of many small
//! probabilities never underflow to zero unless the true value is zero. A
//! row whose mass is entirely zero ends the recursion early ("dead
//! sequence"): the remaining rows become `-inf` (log) or `0` (normalized).
//!
//! All kernels take `ndarray` views over caller memory and write in place.
//! `Hmm` in `common` is the checked entry point that validates inputs.
//!
pub mod backward;
pub mod common;
pub mod forward;
pub mod sample;
pub mod stats;
pub mod viterbi;

pub use backward::{messages_backwards_log, messages_backwards_log_with};
pub use common::{ExpectedStats, Hmm};
pub use forward::{
    messages_forwards_log, messages_forwards_log_with, messages_forwards_normalized,
    messages_forwards_normalized_with,
};
pub use sample::{
    sample_backwards_normalized, sample_backwards_normalized_with, sample_forwards_log,
    sample_forwards_log_with, sample_prior,
};
pub use viterbi::{viterbi, viterbi_with};

#[cfg(test)]
mod tests;
