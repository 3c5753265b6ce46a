//!
//! Caller-owned scratch buffers of the message kernels
//!
//! Every kernel comes in two flavors: `foo(..)` allocates a fresh
//! `Workspace` for the call, and `foo_with(.., &mut Workspace)` reuses the
//! given one. Keeping one `Workspace` per worker thread removes all
//! allocation from the hot loop.
//!
use crate::float::HmmFloat;
use ndarray::{s, Array2, ArrayViewMut1};

/// Number of state-sized scratch rows a kernel may use at once.
const N_STATE_ROWS: usize = 3;
/// Number of block-sized scratch rows a kernel may use at once.
const N_BLOCK_ROWS: usize = 2;

///
/// Scratch buffers sized for `n_states` states and `n_blocks` blocks.
/// They grow on demand and are never shrunk.
///
#[derive(Debug, Clone)]
pub struct Workspace<F> {
    states: Array2<F>,
    blocks: Array2<F>,
}

///
/// Disjoint mutable views into a `Workspace`, borrowed for one kernel call.
///
pub struct Scratch<'a, F> {
    pub a: ArrayViewMut1<'a, F>,
    pub b: ArrayViewMut1<'a, F>,
    pub c: ArrayViewMut1<'a, F>,
    pub block_a: ArrayViewMut1<'a, F>,
    pub block_b: ArrayViewMut1<'a, F>,
}

impl<F: HmmFloat> Workspace<F> {
    ///
    /// Workspace for a flat HMM with `n_states` states.
    ///
    pub fn new(n_states: usize) -> Self {
        Workspace::with_blocks(n_states, 0)
    }
    ///
    /// Workspace for a sub-HMM with `n_states` sub-states in total and `n_blocks` blocks.
    ///
    pub fn with_blocks(n_states: usize, n_blocks: usize) -> Self {
        Workspace {
            states: Array2::zeros((N_STATE_ROWS, n_states)),
            blocks: Array2::zeros((N_BLOCK_ROWS, n_blocks)),
        }
    }
    /// Current capacity `(n_states, n_blocks)`
    pub fn capacity(&self) -> (usize, usize) {
        (self.states.ncols(), self.blocks.ncols())
    }
    ///
    /// Grow the buffers if they are smaller than requested.
    ///
    pub fn reserve(&mut self, n_states: usize, n_blocks: usize) {
        if self.states.ncols() < n_states {
            self.states = Array2::zeros((N_STATE_ROWS, n_states));
        }
        if self.blocks.ncols() < n_blocks {
            self.blocks = Array2::zeros((N_BLOCK_ROWS, n_blocks));
        }
    }
    ///
    /// Borrow the scratch rows, trimmed to exactly `n_states` and `n_blocks`.
    ///
    pub fn scratch(&mut self, n_states: usize, n_blocks: usize) -> Scratch<'_, F> {
        self.reserve(n_states, n_blocks);
        let (a, b, c) = self.states.multi_slice_mut((
            s![0, ..n_states],
            s![1, ..n_states],
            s![2, ..n_states],
        ));
        let (block_a, block_b) = self
            .blocks
            .multi_slice_mut((s![0, ..n_blocks], s![1, ..n_blocks]));
        Scratch {
            a,
            b,
            c,
            block_a,
            block_b,
        }
    }
}
