//!
//! Message passing primitives of Hidden Markov Models
//!
//! * `hmm`: flat HMM over an explicit `M x M` transition matrix
//! * `subhmm`: block-factored (sub-HMM) state space whose `N x N` transition
//!   matrix is never materialized
//!
//! Every kernel reads caller-owned `ndarray` views and writes its output in
//! place. See `hmm::Hmm` and `subhmm::SubHmm` for the checked entry points.
//!
pub mod batch;
pub mod error;
pub mod float;
pub mod hmm;
pub mod mocks;
pub mod model;
pub mod picker;
pub mod prelude;
pub mod prob;
#[cfg(feature = "python")]
pub mod python;
pub mod subhmm;
pub mod utils;
pub mod workspace;

#[macro_use]
extern crate approx;
