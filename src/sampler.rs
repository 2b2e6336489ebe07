//! The decision port events draw outcomes through.
//!
//! A probability vector lists mutually exclusive outcomes. It need not sum to one: whatever mass
//! is left over is an implicit trailing "nothing happens" outcome, reported as index
//! `probabilities.len()`. Vectors are never normalized.
use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub trait Sampler {
    /// Returns the index of the realized outcome, or `probabilities.len()` if none fired.
    fn get_decision(&mut self, probabilities: &[f64]) -> usize;
}

/// Index of the first outcome whose cumulative probability exceeds `u`.
fn first_exceeding(probabilities: &[f64], u: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    probabilities.len()
}

/// A seeded pseudo-random sampler. One sampler must not be shared between threads; give each
/// worker its own seed.
pub struct RandomSampler {
    rng: SmallRng,
}

impl RandomSampler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        RandomSampler {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for RandomSampler {
    fn get_decision(&mut self, probabilities: &[f64]) -> usize {
        let u: f64 = self.rng.random_range(0.0..1.0);
        first_exceeding(probabilities, u)
    }
}

/// Replays a fixed sequence of decisions. Once the script is exhausted every draw reports "no
/// outcome". Every probability vector it was asked about is kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSampler {
    decisions: VecDeque<usize>,
    pub requests: Vec<Vec<f64>>,
}

impl ScriptedSampler {
    #[must_use]
    pub fn new(decisions: &[usize]) -> Self {
        ScriptedSampler {
            decisions: decisions.iter().copied().collect(),
            requests: Vec::new(),
        }
    }

    /// Always answers `index`.
    #[must_use]
    pub fn constant(index: usize, draws: usize) -> Self {
        ScriptedSampler::new(&vec![index; draws])
    }

    pub fn push(&mut self, decision: usize) {
        self.decisions.push_back(decision);
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.decisions.len()
    }
}

impl Sampler for ScriptedSampler {
    fn get_decision(&mut self, probabilities: &[f64]) -> usize {
        self.requests.push(probabilities.to_vec());
        self.decisions.pop_front().unwrap_or(probabilities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_selection() {
        let probabilities = [0.1, 0.2, 0.3];
        assert_eq!(first_exceeding(&probabilities, 0.0), 0);
        assert_eq!(first_exceeding(&probabilities, 0.15), 1);
        assert_eq!(first_exceeding(&probabilities, 0.55), 2);
        assert_eq!(first_exceeding(&probabilities, 0.7), 3);
        assert_eq!(first_exceeding(&[], 0.5), 0);
    }

    #[test]
    fn certain_and_impossible_outcomes() {
        let mut sampler = RandomSampler::new(42);
        for _ in 0..1000 {
            assert_eq!(sampler.get_decision(&[1.0]), 0);
            assert_eq!(sampler.get_decision(&[0.0]), 1);
            assert_eq!(sampler.get_decision(&[0.0, 0.0, 1.0]), 2);
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = RandomSampler::new(7);
        let mut b = RandomSampler::new(7);
        let draws_a: Vec<usize> = (0..100).map(|_| a.get_decision(&[0.3, 0.3])).collect();
        let draws_b: Vec<usize> = (0..100).map(|_| b.get_decision(&[0.3, 0.3])).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn frequencies_follow_probabilities() {
        let mut sampler = RandomSampler::new(1234);
        let n = 20_000;
        let hits = (0..n).filter(|_| sampler.get_decision(&[0.25]) == 0).count();
        #[allow(clippy::cast_precision_loss)]
        let frequency = hits as f64 / f64::from(n);
        assert!((frequency - 0.25).abs() < 0.02, "frequency {frequency}");
    }

    #[test]
    fn scripted_replays_then_reports_nothing() {
        let mut sampler = ScriptedSampler::new(&[0, 2]);
        assert_eq!(sampler.get_decision(&[0.5, 0.5]), 0);
        assert_eq!(sampler.get_decision(&[0.1, 0.2, 0.3]), 2);
        assert_eq!(sampler.get_decision(&[0.1, 0.2, 0.3]), 3);
        assert_eq!(sampler.requests.len(), 3);
        assert_eq!(sampler.requests[0], vec![0.5, 0.5]);
    }
}
