//!
//! Small fixed and random models for tests and benchmarks
//!
use crate::model::SubHmmParams;
use ndarray::{array, Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// Two-state weather model observed over 6 days.
///
/// ```text
/// A  = [[0.7, 0.3], [0.4, 0.6]]     pi0 = [0.6, 0.4]
/// B  = [[0.1, 0.4, 0.5], [0.6, 0.3, 0.1]]
/// x  = [0, 1, 2, 2, 0, 1]
/// ```
///
/// Returns `(A, pi0, aBl)` with `aBl[t, i] = log B[i, x[t]]`.
///
pub fn mock_weather() -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let trans = array![[0.7, 0.3], [0.4, 0.6]];
    let init = array![0.6, 0.4];
    let emission = array![[0.1, 0.4, 0.5], [0.6, 0.3, 0.1]];
    let obs = [0, 1, 2, 2, 0, 1];
    let abl = Array2::from_shape_fn((obs.len(), 2), |(t, i)| f64::ln(emission[[i, obs[t]]]));
    (trans, init, abl)
}

///
/// Three-state left-to-right-ish model with 5 steps and one forbidden transition (2 -> 0).
///
pub fn mock_three_state() -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let trans = array![[0.5, 0.3, 0.2], [0.1, 0.6, 0.3], [0.0, 0.4, 0.6]];
    let init = array![0.5, 0.3, 0.2];
    let abl = array![
        [-0.2, -1.5, -2.0],
        [-1.0, -0.4, -1.2],
        [-2.5, -0.9, -0.3],
        [-0.7, -0.7, -0.7],
        [-3.0, -1.1, -0.2],
    ];
    (trans, init, abl)
}

///
/// Random dense model with all entries positive, and random emissions.
///
pub fn mock_random_hmm(
    n_states: usize,
    n_steps: usize,
    seed: u64,
) -> (Array2<f64>, Array1<f64>, Array2<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let trans = random_stochastic(&mut rng, n_states);
    let init = random_distribution(&mut rng, n_states);
    let abl = random_emissions(&mut rng, n_steps, n_states);
    (trans, init, abl)
}

fn random_distribution<R: Rng>(rng: &mut R, n: usize) -> Array1<f64> {
    let v = Array1::from_shape_fn(n, |_| rng.gen_range(0.05..1.0));
    let total = v.sum();
    v / total
}

fn random_stochastic<R: Rng>(rng: &mut R, n: usize) -> Array2<f64> {
    let mut m = Array2::zeros((n, n));
    for mut row in m.rows_mut() {
        row.assign(&random_distribution(rng, n));
    }
    m
}

fn random_emissions<R: Rng>(rng: &mut R, n_steps: usize, n_states: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_steps, n_states), |_| rng.gen_range(0.05f64..1.0).ln())
}

///
/// Random emission log likelihoods `log U(0.05, 1)` (T x N).
///
pub fn mock_emissions(n_states: usize, n_steps: usize, seed: u64) -> Array2<f64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    random_emissions(&mut rng, n_steps, n_states)
}

///
/// Sub-HMM with `B = 2` and `Nsubs = [2, 3]`
///
/// ```text
/// Super = [[0.3, 0.7], [0.6, 0.4]]    super_init = [0.4, 0.6]
/// S_0   = [[0.9, 0.1], [0.2, 0.8]]    init_0     = [0.5, 0.5]
/// S_1   = [[0.5, 0.25, 0.25],         init_1     = [0.2, 0.3, 0.5]
///          [0.1, 0.6,  0.3 ],
///          [0.3, 0.3,  0.4 ]]
/// ps    = [0.1, 0.3, 0.2, 0.05, 0.5]
/// ```
///
pub fn mock_subhmm_small() -> SubHmmParams {
    SubHmmParams {
        nsubs: vec![2, 3],
        rs: vec![0, 0, 1, 1, 1],
        ps: array![0.1, 0.3, 0.2, 0.05, 0.5],
        super_trans: array![[0.3, 0.7], [0.6, 0.4]],
        super_init: array![0.4, 0.6],
        sub_transs: vec![
            array![[0.9, 0.1], [0.2, 0.8]],
            array![[0.5, 0.25, 0.25], [0.1, 0.6, 0.3], [0.3, 0.3, 0.4]],
        ],
        sub_inits: vec![array![0.5, 0.5], array![0.2, 0.3, 0.5]],
    }
}

///
/// Random sub-HMM with the given block sizes.
///
pub fn mock_subhmm_random(nsubs: &[usize], seed: u64) -> SubHmmParams {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let n_blocks = nsubs.len();
    let rs: Vec<u32> = nsubs
        .iter()
        .enumerate()
        .flat_map(|(b, &n)| std::iter::repeat(b as u32).take(n))
        .collect();
    let ps = Array1::from_shape_fn(rs.len(), |_| rng.gen_range(0.0..1.0));
    SubHmmParams {
        nsubs: nsubs.iter().map(|&n| n as u32).collect(),
        rs,
        ps,
        super_trans: random_stochastic(&mut rng, n_blocks),
        super_init: random_distribution(&mut rng, n_blocks),
        sub_transs: nsubs
            .iter()
            .map(|&n| random_stochastic(&mut rng, n))
            .collect(),
        sub_inits: nsubs
            .iter()
            .map(|&n| random_distribution(&mut rng, n))
            .collect(),
    }
}
