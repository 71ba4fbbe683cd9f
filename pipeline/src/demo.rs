//! Minimal collaborators for exercising the pipeline end to end.
//!
//! The pipeline is generic over its environment and network; these stubs
//! are the smallest implementations that make the whole loop run: a
//! deterministic two-player counting game and a trainable wrapper around
//! the uniform network that only advances its step counter.

use std::sync::Arc;

use reverie_core::{Action, Environment, Network, Observation, Player, UniformNetwork};
use tracing::debug;

use crate::replay::Batch;
use crate::trainer::TrainableNetwork;

/// Two players alternate adding 1 or 2 to a shared counter; whoever
/// reaches the target first wins. Adding 2 is only legal while it does
/// not overshoot.
#[derive(Debug, Clone)]
pub struct RaceGame {
    target: u32,
    count: u32,
    to_play: Player,
}

impl RaceGame {
    pub fn new(target: u32) -> Self {
        Self {
            target,
            count: 0,
            to_play: Player(0),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Environment for RaceGame {
    fn action_space(&self) -> usize {
        2
    }

    fn num_players(&self) -> usize {
        2
    }

    fn legal_actions(&self) -> Vec<Action> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut actions = vec![Action(0)];
        if self.count + 2 <= self.target {
            actions.push(Action(1));
        }
        actions
    }

    fn to_play(&self) -> Player {
        self.to_play
    }

    fn is_terminal(&self) -> bool {
        self.count >= self.target
    }

    fn apply(&mut self, action: Action) -> f32 {
        self.count += action.index() as u32 + 1;
        self.to_play = Player(1 - self.to_play.0);
        if self.is_terminal() {
            1.0
        } else {
            0.0
        }
    }

    fn observation(&self) -> Observation {
        vec![
            self.count as f32 / self.target as f32,
            self.to_play.0 as f32,
        ]
    }
}

/// Trainable stand-in for a real network: optimization only advances the
/// step counter, snapshots are uniform networks stamped with it.
#[derive(Debug, Clone)]
pub struct UniformTrainable {
    action_space: usize,
    hidden_dim: usize,
    steps: u64,
    batches_seen: u64,
}

impl UniformTrainable {
    pub fn new(action_space: usize, hidden_dim: usize) -> Self {
        Self {
            action_space,
            hidden_dim,
            steps: 0,
            batches_seen: 0,
        }
    }

    pub fn batches_seen(&self) -> u64 {
        self.batches_seen
    }
}

impl TrainableNetwork for UniformTrainable {
    fn training_steps(&self) -> u64 {
        self.steps
    }

    fn optimize(&mut self, batch: Batch) {
        self.batches_seen += 1;
        self.steps += 1;
        debug!(
            step = self.steps,
            batch_size = batch.len(),
            "optimization step (no-op weights)"
        );
    }

    fn snapshot(&self) -> Arc<dyn Network> {
        Arc::new(
            UniformNetwork::new(self.action_space, self.hidden_dim)
                .with_training_steps(self.steps),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn race_game_alternates_and_terminates() {
        let mut game = RaceGame::new(5);
        assert_eq!(game.to_play(), Player(0));

        assert!((game.apply(Action(1)) - 0.0).abs() < 1e-6); // count 2
        assert_eq!(game.to_play(), Player(1));
        assert!((game.apply(Action(1)) - 0.0).abs() < 1e-6); // count 4
        let reward = game.apply(Action(0)); // count 5, terminal
        assert!((reward - 1.0).abs() < 1e-6);
        assert!(game.is_terminal());
        assert!(game.legal_actions().is_empty());
    }

    #[test]
    fn overshooting_moves_are_illegal() {
        let mut game = RaceGame::new(4);
        game.apply(Action(1)); // count 2
        game.apply(Action(0)); // count 3
        assert_eq!(game.legal_actions(), vec![Action(0)]);
    }

    #[test]
    fn trainable_counter_tracks_optimize_calls() {
        let mut trainable = UniformTrainable::new(2, 4);
        assert_eq!(trainable.training_steps(), 0);

        trainable.optimize(Vec::new());
        trainable.optimize(Vec::new());

        assert_eq!(trainable.training_steps(), 2);
        assert_eq!(trainable.snapshot().training_steps(), 2);
    }
}
