use rand::{
    distributions::{Distribution, WeightedIndex},
    thread_rng, Rng,
};

use crate::decay::Decay;

/// Exploration policy result
pub enum Choice {
    Explore,
    Exploit,
}

/// Epsilon greedy exploration policy with a time-decaying epsilon threshold
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Invoke epsilon greedy policy at time `t`
    pub fn choose(&self, t: f32) -> Choice {
        let epsilon = self.epsilon.evaluate(t);
        if thread_rng().gen::<f32>() > epsilon {
            Choice::Exploit
        } else {
            Choice::Explore
        }
    }
}

/// Softmax exploration policy (also known as Boltzmann or Gibbs exploration)
/// with a time-decaying temperature
///
/// Temperature must be positive for every `t` the policy is evaluated at; this
/// is a precondition enforced by the configuration bounds, not re-checked here.
pub struct Softmax<D: Decay> {
    temperature: D,
}

impl<D: Decay> Softmax<D> {
    pub fn new(decay: D) -> Self {
        Self { temperature: decay }
    }

    /// Gibbs probabilities exp(v<sub>i</sub>/τ) / Σ exp(v<sub>j</sub>/τ) for
    /// each value in `q_values`
    pub fn weights(&self, t: f32, q_values: &[f32]) -> Vec<f32> {
        let tau = self.temperature.evaluate(t);
        let exponentials: Vec<f32> = q_values.iter().map(|v| (v / tau).exp()).collect();
        let sum: f32 = exponentials.iter().sum();
        exponentials.into_iter().map(|x| x / sum).collect()
    }

    /// Sample an index into `q_values` according to the Gibbs distribution at
    /// time `t`
    pub fn choose(&self, t: f32, q_values: &[f32]) -> usize {
        let dist = WeightedIndex::new(self.weights(t, q_values)).expect("`q_values` is not empty");
        dist.sample(&mut thread_rng())
    }
}
