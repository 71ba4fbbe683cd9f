//! Network contract: the evaluator as seen by the search engine.
//!
//! The search engine only ever calls two inference entry points and reads
//! a checkpoint counter. Everything else about the network (architecture,
//! weights, gradient computation) is somebody else's problem.

use crate::types::{Action, HiddenState, Observation};

/// Output of a single network inference call.
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// Value estimate from the perspective of the player to move.
    pub value: f32,

    /// Immediate reward predicted for the transition that produced this
    /// state. Zero for initial inference.
    pub reward: f32,

    /// Raw policy logits over the full action space. The search engine
    /// restricts and renormalizes these over whatever action set it
    /// expands with.
    pub policy_logits: Vec<f32>,

    /// Latent state to feed back into [`Network::recurrent_inference`].
    pub hidden_state: HiddenState,
}

/// A frozen network snapshot.
///
/// Inference is total: both calls always produce an output. Snapshots are
/// immutable and safe to share across actor tasks; a new checkpoint is a
/// new snapshot, never a mutation of an old one.
pub trait Network: Send + Sync {
    /// Encode a real observation into the latent space and evaluate it.
    /// The returned reward is zero by contract.
    fn initial_inference(&self, observation: &Observation) -> NetworkOutput;

    /// Advance the latent state by one action and evaluate the result.
    fn recurrent_inference(&self, hidden_state: &HiddenState, action: Action) -> NetworkOutput;

    /// Monotonically non-decreasing optimization-step counter at the time
    /// this snapshot was taken.
    fn training_steps(&self) -> u64;
}

/// Untrained placeholder network: flat policy, zero value and reward.
///
/// Used before the first real checkpoint exists and as a deterministic
/// evaluator in tests.
#[derive(Debug, Clone)]
pub struct UniformNetwork {
    action_space: usize,
    hidden_dim: usize,
    training_steps: u64,
}

impl UniformNetwork {
    pub fn new(action_space: usize, hidden_dim: usize) -> Self {
        Self {
            action_space,
            hidden_dim,
            training_steps: 0,
        }
    }

    /// Stamp the snapshot with a checkpoint counter value.
    pub fn with_training_steps(mut self, steps: u64) -> Self {
        self.training_steps = steps;
        self
    }

    fn output(&self) -> NetworkOutput {
        NetworkOutput {
            value: 0.0,
            reward: 0.0,
            policy_logits: vec![0.0; self.action_space],
            hidden_state: vec![0.0; self.hidden_dim],
        }
    }
}

impl Network for UniformNetwork {
    fn initial_inference(&self, _observation: &Observation) -> NetworkOutput {
        self.output()
    }

    fn recurrent_inference(&self, _hidden_state: &HiddenState, _action: Action) -> NetworkOutput {
        self.output()
    }

    fn training_steps(&self) -> u64 {
        self.training_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_network_is_flat_and_neutral() {
        let net = UniformNetwork::new(4, 8);
        let out = net.initial_inference(&vec![0.0; 2]);

        assert_eq!(out.policy_logits, vec![0.0; 4]);
        assert_eq!(out.hidden_state.len(), 8);
        assert!(out.value.abs() < 1e-6);
        assert!(out.reward.abs() < 1e-6);
    }

    #[test]
    fn recurrent_inference_matches_initial() {
        let net = UniformNetwork::new(3, 2);
        let first = net.initial_inference(&vec![1.0]);
        let second = net.recurrent_inference(&first.hidden_state, Action(1));

        assert_eq!(second.policy_logits.len(), 3);
        assert!(second.value.abs() < 1e-6);
    }

    #[test]
    fn training_steps_stamp() {
        let net = UniformNetwork::new(2, 2).with_training_steps(17);
        assert_eq!(net.training_steps(), 17);
    }
}
