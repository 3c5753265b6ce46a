//!
//! Tests across the flat HMM kernels
//!
use super::*;
use crate::mocks::{mock_random_hmm, mock_three_state, mock_weather};
use crate::workspace::Workspace;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// Empirical `P(z[t] = i)` over `n` paths drawn by `draw`
///
fn empirical_marginals<D>(n_steps: usize, n_states: usize, n: usize, mut draw: D) -> Array2<f64>
where
    D: FnMut() -> Array1<usize>,
{
    let mut counts = Array2::<f64>::zeros((n_steps, n_states));
    for _ in 0..n {
        let seq = draw();
        for (t, &k) in seq.iter().enumerate() {
            counts[[t, k]] += 1.0;
        }
    }
    counts / n as f64
}

#[test]
fn hmm_samplers_match_smoothed_posteriors() {
    let (trans, init, abl) = mock_three_state();
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let stats = hmm.expected_statistics(abl.view()).unwrap();
    let (n_steps, n_states) = abl.dim();
    let n = 20000;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
    let forwards = empirical_marginals(n_steps, n_states, n, || {
        hmm.sample_forwards(&mut rng, abl.view()).unwrap()
    });
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let backwards = empirical_marginals(n_steps, n_states, n, || {
        hmm.sample_backwards(&mut rng, abl.view()).unwrap()
    });
    for t in 0..n_steps {
        for i in 0..n_states {
            let p = stats.expectations[[t, i]];
            assert_abs_diff_eq!(forwards[[t, i]], p, epsilon = 0.015);
            assert_abs_diff_eq!(backwards[[t, i]], p, epsilon = 0.015);
        }
    }
}

#[test]
fn hmm_samplers_never_use_forbidden_transitions() {
    // 2 -> 0 has zero probability in the three-state model
    let (trans, init, abl) = mock_three_state();
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
    for _ in 0..2000 {
        for seq in [
            hmm.sample_forwards(&mut rng, abl.view()).unwrap(),
            hmm.sample_backwards(&mut rng, abl.view()).unwrap(),
        ] {
            for t in 1..seq.len() {
                assert!(!(seq[t - 1] == 2 && seq[t] == 0));
            }
        }
    }
}

#[test]
fn hmm_viterbi_score_is_joint_probability_of_path() {
    let (trans, init, abl) = mock_random_hmm(4, 12, 7);
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let (path, score) = hmm.viterbi(abl.view()).unwrap();
    let mut joint = init[path[0]].ln() + abl[[0, path[0]]];
    for t in 1..path.len() {
        joint += trans[[path[t - 1], path[t]]].ln() + abl[[t, path[t]]];
    }
    assert_abs_diff_eq!(score, joint, epsilon = 1e-10);
    // the best path can not be more likely than all paths together
    assert!(score <= hmm.log_likelihood(abl.view()).unwrap());
}

#[test]
fn hmm_log_and_backward_likelihoods_agree() {
    let (trans, init, abl) = mock_random_hmm(5, 30, 3);
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let alphal = hmm.messages_forwards_log(abl.view()).unwrap();
    let betal = hmm.messages_backwards_log(abl.view()).unwrap();
    let (_, logtot) = hmm.messages_forwards_normalized(abl.view()).unwrap();
    let lf = stats::log_likelihood_forwards(alphal.view());
    let lb = stats::log_likelihood_backwards(init.view(), abl.view(), betal.view());
    assert_abs_diff_eq!(lf, logtot, epsilon = 1e-9);
    assert_abs_diff_eq!(lb, logtot, epsilon = 1e-9);
}

#[test]
fn hmm_expected_statistics_of_weather() {
    let (trans, init, abl) = mock_weather();
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let stats = hmm.expected_statistics(abl.view()).unwrap();
    assert_abs_diff_eq!(
        stats.log_likelihood,
        hmm.log_likelihood(abl.view()).unwrap(),
        epsilon = 1e-10
    );
    assert_abs_diff_eq!(stats.transcounts.sum(), 5.0, epsilon = 1e-9);
    assert!(stats.transcounts.iter().all(|&x| x >= 0.0));
}

#[test]
fn hmm_workspace_is_reusable_across_sizes() {
    let mut ws = Workspace::new(2);
    for (n_states, seed) in [(2, 0), (6, 1), (3, 2)] {
        let (trans, init, abl) = mock_random_hmm(n_states, 8, seed);
        let mut a1 = Array2::zeros(abl.dim());
        let mut a2 = Array2::zeros(abl.dim());
        let l1 = messages_forwards_normalized_with(
            trans.view(),
            init.view(),
            abl.view(),
            a1.view_mut(),
            &mut ws,
        );
        let l2 = messages_forwards_normalized(trans.view(), init.view(), abl.view(), a2.view_mut());
        assert_eq!(l1, l2);
        assert_eq!(a1, a2);
    }
    assert_eq!(ws.capacity().0, 6);
}

#[test]
fn hmm_prior_sample_has_requested_length() {
    let (trans, init, _) = mock_weather();
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
    assert_eq!(hmm.sample_prior(&mut rng, 17).unwrap().len(), 17);
    assert_eq!(hmm.sample_prior(&mut rng, 0).unwrap().len(), 0);
}

#[test]
fn hmm_expected_statistics_when_likely_states_are_not_connected() {
    let trans: ndarray::Array2<f64> = ndarray::array![[1.0, 0.0], [0.0, 1.0]];
    let init = ndarray::array![0.5, 0.5];
    let abl = ndarray::array![[0.0, -800.0], [-800.0, 0.0]];
    let hmm = Hmm::new(trans.view(), init.view()).unwrap();
    let stats = hmm.expected_statistics(abl.view()).unwrap();
    assert!(stats.log_likelihood.is_finite());
    assert_abs_diff_eq!(stats.transcounts.sum(), 1.0, epsilon = 1e-9);
    assert_eq!(stats.transcounts[[0, 1]], 0.0);
    assert_eq!(stats.transcounts[[1, 0]], 0.0);
}
