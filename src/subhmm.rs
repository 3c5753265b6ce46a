//!
//! Sub-HMM: message passing over a block-factored state space
//!
//! The `N` sub-states are partitioned into `B` contiguous blocks, block `b`
//! holding `Nsubs[b]` sub-states. The `N x N` transition matrix is
//!
//! ```text
//! A[k,l] = (1 - ps[k]) [rs[k] = rs[l]] S_{rs[k]}[k~, l~]
//!        + ps[k] Super[rs[k], rs[l]] init_{rs[l]}[l~]
//! ```
//!
//! where `rs[k]` is the block owning `k`, `k~` its offset inside the block,
//! `S_b` / `init_b` the block-local transition matrix and initial
//! distribution, and `ps[k]` the weight of leaving the block through the
//! super-level chain. `A` is never formed: `mult` computes `A v` and `v A`
//! in `O(N maxNsub + B^2)`.
//!
//! * `common`: `SubHmm` descriptor (validation, dense form, checked entry points)
//! * `mult`: `fast_mult` / `fast_left_mult`
//! * `messages`: normalized forward/backward messages
//! * `sparse`: compressed-row transition matrices
//! * `sample`: backward sampling over a compressed-row `A^T`
//!
pub mod common;
pub mod messages;
pub mod mult;
pub mod sample;
pub mod sparse;

pub use common::SubHmm;
pub use messages::{
    messages_backwards_normalized, messages_backwards_normalized_with,
    messages_forwards_normalized, messages_forwards_normalized_with,
};
pub use mult::{fast_left_mult, fast_left_mult_with, fast_mult, fast_mult_with};
pub use sample::sample_backwards_normalized;
pub use sparse::{CsrMatrix, CsrView};
