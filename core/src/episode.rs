//! Episode record produced by one self-play run.
//!
//! Each step stores the observation the search started from, the action
//! taken, the immediate reward, and the search statistics (root visit
//! distribution and root value) that become training targets.

use serde::{Deserialize, Serialize};

use crate::types::{Action, Observation, Player};

/// Training target for one unroll position: n-step value, immediate
/// reward, and the visit-count policy. The policy is empty for absorbing
/// positions past the end of the episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub value: f32,
    pub reward: f32,
    pub policy: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Episode {
    observations: Vec<Observation>,
    actions: Vec<Action>,
    rewards: Vec<f32>,
    to_play: Vec<Player>,
    root_values: Vec<f32>,
    child_visits: Vec<Vec<f32>>,
}

impl Episode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed move: the observation searched from, whose
    /// turn it was, the chosen action and its reward, and the root's
    /// search statistics.
    pub fn record_step(
        &mut self,
        observation: Observation,
        to_play: Player,
        action: Action,
        reward: f32,
        visit_distribution: Vec<f32>,
        root_value: f32,
    ) {
        self.observations.push(observation);
        self.to_play.push(to_play);
        self.actions.push(action);
        self.rewards.push(reward);
        self.child_visits.push(visit_distribution);
        self.root_values.push(root_value);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn observation(&self, index: usize) -> &Observation {
        &self.observations[index]
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    pub fn root_values(&self) -> &[f32] {
        &self.root_values
    }

    pub fn visit_distribution(&self, index: usize) -> &[f32] {
        &self.child_visits[index]
    }

    /// Total undiscounted reward, for logging.
    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Actions from `index` for up to `unroll_steps` positions; shorter
    /// when the episode ends first.
    pub fn unroll_actions(&self, index: usize, unroll_steps: usize) -> Vec<Action> {
        let end = (index + unroll_steps).min(self.actions.len());
        self.actions[index..end].to_vec()
    }

    /// Build value/reward/policy targets for positions
    /// `index ..= index + unroll_steps`.
    ///
    /// The value target bootstraps from the searched root value `td_steps`
    /// ahead, discounted, plus the discounted rewards in between. When the
    /// bootstrap position falls past the end of the episode the bootstrap
    /// term is dropped and the target degrades to the discounted
    /// Monte Carlo return of the remaining steps.
    pub fn make_targets(
        &self,
        index: usize,
        unroll_steps: usize,
        td_steps: usize,
        discount: f32,
    ) -> Vec<Target> {
        let mut targets = Vec::with_capacity(unroll_steps + 1);

        for current in index..=index + unroll_steps {
            let bootstrap = current + td_steps;
            let mut value = if bootstrap < self.root_values.len() {
                self.root_values[bootstrap] * discount.powi(td_steps as i32)
            } else {
                0.0
            };

            let horizon = bootstrap.min(self.rewards.len());
            for (i, reward) in self.rewards[current.min(horizon)..horizon].iter().enumerate() {
                value += reward * discount.powi(i as i32);
            }

            if current < self.root_values.len() {
                targets.push(Target {
                    value,
                    reward: self.rewards[current],
                    policy: self.child_visits[current].clone(),
                });
            } else {
                // Absorbing state past the end of the episode.
                targets.push(Target {
                    value: 0.0,
                    reward: 0.0,
                    policy: Vec::new(),
                });
            }
        }

        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode_with_rewards(rewards: &[f32], root_values: &[f32]) -> Episode {
        let mut episode = Episode::new();
        for (i, (&reward, &value)) in rewards.iter().zip(root_values).enumerate() {
            episode.record_step(
                vec![i as f32],
                Player(i % 2),
                Action(0),
                reward,
                vec![1.0, 0.0],
                value,
            );
        }
        episode
    }

    #[test]
    fn monte_carlo_target_when_bootstrap_past_end() {
        let episode = episode_with_rewards(&[1.0, 0.0, 1.0], &[0.5, 0.5, 0.5]);

        // td_steps reaches past the end: pure discounted return.
        let targets = episode.make_targets(0, 0, 10, 0.5);
        assert_eq!(targets.len(), 1);
        let expected = 1.0 + 0.0 * 0.5 + 1.0 * 0.25;
        assert!((targets[0].value - expected).abs() < 1e-6);
        assert!((targets[0].reward - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bootstrapped_target_uses_discounted_root_value() {
        let episode = episode_with_rewards(&[0.0, 0.0, 0.0, 0.0], &[0.1, 0.2, 0.3, 0.4]);

        let targets = episode.make_targets(0, 0, 2, 0.5);
        // value = root_values[2] * 0.5^2, no rewards in between
        assert!((targets[0].value - 0.3 * 0.25).abs() < 1e-6);
    }

    #[test]
    fn absorbing_positions_have_empty_policy() {
        let episode = episode_with_rewards(&[1.0], &[0.5]);

        let targets = episode.make_targets(0, 2, 1, 1.0);
        assert_eq!(targets.len(), 3);
        assert!(!targets[0].policy.is_empty());
        assert!(targets[1].policy.is_empty());
        assert!(targets[2].policy.is_empty());
        assert!(targets[2].value.abs() < 1e-6);
    }

    #[test]
    fn unroll_actions_truncate_at_episode_end() {
        let mut episode = Episode::new();
        for i in 0..3 {
            episode.record_step(vec![], Player(0), Action(i), 0.0, vec![1.0], 0.0);
        }

        assert_eq!(episode.unroll_actions(1, 5), vec![Action(1), Action(2)]);
        assert_eq!(episode.unroll_actions(0, 2), vec![Action(0), Action(1)]);
    }
}
