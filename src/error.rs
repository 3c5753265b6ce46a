use thiserror::Error;

/// Errors reported by the checked entry points, the sampling kernels and the adapters.
///
/// A zero-probability ("dead") sequence is not an error: it is reported as a
/// `-inf` log likelihood.
#[derive(Debug, Error)]
pub enum HmmError {
    #[error("Invalid number of states: {0} (must be > 0)")]
    InvalidStateCount(usize),

    #[error("Sequence must have at least one time step")]
    EmptySequence,

    #[error("Invalid dimensions of {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} must be a probability (got {value} at index {index})")]
    InvalidProbability {
        what: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{what} must sum to 1.0 (got {sum})")]
    InvalidProbabilitySum { what: &'static str, sum: f64 },

    #[error("Transition matrix row {row} must sum to 1.0 (got {sum})")]
    InvalidTransitionRow { row: usize, sum: f64 },

    #[error("Sub-state {state} is assigned to block {block}, which is not its owner among {n_blocks} blocks")]
    InvalidBlockIndex {
        state: usize,
        block: usize,
        n_blocks: usize,
    },

    #[error("Block length {len} must be in 1..{n_steps}")]
    InvalidBlockLength { len: usize, n_steps: usize },

    #[error("State index {0} does not fit into the index type")]
    IndexOverflow(usize),

    #[error("Cannot sample from weights that are all zero")]
    ZeroWeights,

    #[error("Sampling weight at index {index} is negative or NaN")]
    InvalidWeight { index: usize },

    #[error("Numerical error: {0}")]
    NumericalError(String),

    #[error("Invalid sparse matrix: {0}")]
    InvalidSparse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
