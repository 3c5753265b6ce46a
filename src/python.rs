//!
//! Python bindings
//!
//! Supported features
//!
//! - flat HMM: viterbi, log likelihood, posterior sampling, smoothed posteriors
//! - sub-HMM given as a JSON string: log likelihood, posterior sampling
//!
//! Matrices are nested lists of floats (row major).
//!
use crate::error::HmmError;
use crate::hmm::Hmm;
use crate::model::{matrix_from_rows, matrix_to_rows, ModelParams};
use ndarray::Array1;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

impl From<HmmError> for PyErr {
    fn from(e: HmmError) -> PyErr {
        match e {
            HmmError::Io(e) => PyIOError::new_err(e.to_string()),
            e => PyValueError::new_err(e.to_string()),
        }
    }
}

///
/// Build the checked model from nested lists and run `f` on it.
///
fn with_hmm<T, F>(trans: Vec<Vec<f64>>, init: Vec<f64>, f: F) -> PyResult<T>
where
    F: FnOnce(&Hmm<'_, f64>) -> Result<T, HmmError>,
{
    let trans = matrix_from_rows("transition matrix", &trans)?;
    let init = Array1::from(init);
    let hmm = Hmm::new(trans.view(), init.view())?;
    Ok(f(&hmm)?)
}

/// Most probable state path and its log joint probability.
#[pyfunction]
fn viterbi(
    trans: Vec<Vec<f64>>,
    init: Vec<f64>,
    abl: Vec<Vec<f64>>,
) -> PyResult<(Vec<usize>, f64)> {
    let abl = matrix_from_rows("emission log likelihoods", &abl)?;
    with_hmm(trans, init, |hmm| {
        let (path, score) = hmm.viterbi(abl.view())?;
        Ok((path.to_vec(), score))
    })
}

/// `log P(x)`
#[pyfunction]
fn log_likelihood(trans: Vec<Vec<f64>>, init: Vec<f64>, abl: Vec<Vec<f64>>) -> PyResult<f64> {
    let abl = matrix_from_rows("emission log likelihoods", &abl)?;
    with_hmm(trans, init, |hmm| hmm.log_likelihood(abl.view()))
}

/// One posterior sample of the state path.
#[pyfunction]
fn sample_states(
    trans: Vec<Vec<f64>>,
    init: Vec<f64>,
    abl: Vec<Vec<f64>>,
    seed: u64,
) -> PyResult<Vec<usize>> {
    let abl = matrix_from_rows("emission log likelihoods", &abl)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    with_hmm(trans, init, |hmm| {
        hmm.sample_backwards(&mut rng, abl.view())
            .map(|path| path.to_vec())
    })
}

/// Smoothed posteriors `P(z[t] = i | x)` and `log P(x)`.
#[pyfunction]
fn expectations(
    trans: Vec<Vec<f64>>,
    init: Vec<f64>,
    abl: Vec<Vec<f64>>,
) -> PyResult<(Vec<Vec<f64>>, f64)> {
    let abl = matrix_from_rows("emission log likelihoods", &abl)?;
    with_hmm(trans, init, |hmm| {
        let stats = hmm.expected_statistics(abl.view())?;
        Ok((matrix_to_rows(&stats.expectations), stats.log_likelihood))
    })
}

/// `log P(x)` under a sub-HMM given as a JSON model string.
#[pyfunction]
fn subhmm_log_likelihood(model: &str, abl: Vec<Vec<f64>>) -> PyResult<f64> {
    let abl = matrix_from_rows("emission log likelihoods", &abl)?;
    match ModelParams::from_json_str(model)? {
        ModelParams::Sub(params) => Ok(params.view()?.log_likelihood(abl.view())?),
        ModelParams::Flat(_) => Err(PyValueError::new_err("expected a sub-HMM model")),
    }
}

/// One posterior sample of the sub-state path under a sub-HMM given as a JSON model string.
#[pyfunction]
fn subhmm_sample_states(model: &str, abl: Vec<Vec<f64>>, seed: u64) -> PyResult<Vec<usize>> {
    let abl = matrix_from_rows("emission log likelihoods", &abl)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    match ModelParams::from_json_str(model)? {
        ModelParams::Sub(params) => Ok(params
            .view()?
            .sample_states(&mut rng, abl.view())?
            .to_vec()),
        ModelParams::Flat(_) => Err(PyValueError::new_err("expected a sub-HMM model")),
    }
}

#[pymodule]
fn hmmsub(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(viterbi, m)?)?;
    m.add_function(wrap_pyfunction!(log_likelihood, m)?)?;
    m.add_function(wrap_pyfunction!(sample_states, m)?)?;
    m.add_function(wrap_pyfunction!(expectations, m)?)?;
    m.add_function(wrap_pyfunction!(subhmm_log_likelihood, m)?)?;
    m.add_function(wrap_pyfunction!(subhmm_sample_states, m)?)?;
    Ok(())
}
