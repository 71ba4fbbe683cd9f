//! Primitive identifiers shared across the workspace.

use serde::{Deserialize, Serialize};

/// Index into a game's fixed action space.
///
/// The policy head of the network is indexed by the same integers, so an
/// `Action` is valid for exactly one action-space size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action(pub usize);

impl Action {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Player to move at a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player(pub usize);

/// Observation tensor handed to the network's representation path.
pub type Observation = Vec<f32>;

/// Opaque latent state produced by the network.
///
/// The search engine caches and forwards these but never interprets their
/// contents.
pub type HiddenState = Vec<f32>;
