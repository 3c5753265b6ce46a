//!
//! globally-available parts
//!
pub use crate::error::HmmError;
pub use crate::float::{HmmFloat, StateIndex};
pub use crate::hmm::{ExpectedStats, Hmm};
pub use crate::model::{HmmParams, ModelParams, SubHmmParams};
pub use crate::subhmm::{CsrMatrix, CsrView, SubHmm};
pub use crate::workspace::Workspace;
