//! Monte Carlo Tree Search over learned latent dynamics.
//!
//! The search plans in the network's latent space: only the root is tied
//! to a real observation, every deeper node is reached by asking the
//! network to imagine the result of an action. Each simulation runs four
//! phases:
//!
//! 1. **Selection**: descend from the root by maximizing a UCB score that
//!    trades the prior-weighted exploration bonus against the normalized
//!    backed-up value
//! 2. **Expansion**: unroll the network's recurrent inference one step
//!    from the leaf's parent, populating the leaf with a latent state,
//!    a predicted reward and softmax priors for its children
//! 3. **Backpropagation**: walk the explicit selection path back to the
//!    root, accumulating perspective-adjusted values and folding each
//!    node's reward into the discounted value carried upward
//! 4. **Normalization**: backed-up mean values feed a running min/max
//!    range so value scores stay comparable to priors regardless of the
//!    game's reward scale
//!
//! Exploration noise is a one-time Dirichlet perturbation of the root
//! priors, applied after the root is expanded and before the first
//! simulation.
//!
//! The tree is arena-allocated and lives for exactly one decision point;
//! the driver discards it after an action is chosen.

pub mod bounds;
pub mod config;
pub mod node;
pub mod search;
pub mod tree;

pub use bounds::{KnownBounds, MinMaxStats};
pub use config::SearchConfig;
pub use node::{Node, NodeId};
pub use search::{run_simulations, select_action, SearchError};
pub use tree::SearchTree;
