//! Environment contract: game rules as seen by the episode driver.
//!
//! The driver only needs legality, turn order, termination, transitions
//! and an observation encoding. Everything else about a game stays in the
//! implementing crate.

use crate::types::{Action, Observation, Player};

pub trait Environment: Send {
    /// Size of the fixed action space the network's policy head covers.
    fn action_space(&self) -> usize;

    /// Number of players alternating turns.
    fn num_players(&self) -> usize;

    /// Actions legal in the current position. Empty only in terminal
    /// positions.
    fn legal_actions(&self) -> Vec<Action>;

    /// Player to move in the current position.
    fn to_play(&self) -> Player;

    fn is_terminal(&self) -> bool;

    /// Apply an action and return the immediate reward from the acting
    /// player's perspective.
    fn apply(&mut self, action: Action) -> f32;

    /// Encode the current position for the network's initial inference.
    fn observation(&self) -> Observation;
}
