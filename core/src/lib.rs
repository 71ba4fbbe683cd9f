//! Shared domain types for the reverie self-play training pipeline.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//!
//! - Primitive identifiers ([`Action`], [`Player`]) and the opaque tensors
//!   exchanged with the network ([`Observation`], [`HiddenState`])
//! - The [`Network`] contract: two inference calls plus a checkpoint
//!   counter. The network's internals (architecture, gradients) live
//!   entirely behind this trait.
//! - The [`Environment`] contract: game rules as seen by the episode
//!   driver. Rule implementations live outside this crate.
//! - [`ActionHistory`], the action sequence threaded through a search
//! - [`Episode`], the per-step record an episode driver produces and the
//!   replay buffer turns into training targets

pub mod episode;
pub mod game;
pub mod history;
pub mod network;
pub mod types;

pub use episode::{Episode, Target};
pub use game::Environment;
pub use history::ActionHistory;
pub use network::{Network, NetworkOutput, UniformNetwork};
pub use types::{Action, HiddenState, Observation, Player};
