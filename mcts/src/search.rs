//! Search loop: selection, expansion and backpropagation.
//!
//! The driver expands the root from a real observation and applies
//! exploration noise; [`run_simulations`] then mutates the tree in place
//! for a fixed simulation budget. Afterwards [`select_action`] turns the
//! root's visit counts into a move.

use rand::Rng;
use reverie_core::{Action, ActionHistory, Network, Player};
use thiserror::Error;
use tracing::trace;

use crate::bounds::MinMaxStats;
use crate::config::SearchConfig;
use crate::node::{Node, NodeId};
use crate::tree::SearchTree;

/// Errors raised by the search engine. All of them are invariant or
/// configuration violations: they abort the current episode's search and
/// nothing else.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cannot expand a node with no legal actions")]
    NoLegalActions,

    #[error("search requires an expanded root")]
    RootNotExpanded,

    #[error("selection visited a node with no children")]
    EmptySelection,

    #[error("invalid value bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: f32, max: f32 },

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
}

/// Run exactly `config.num_simulations` simulations against the given
/// network snapshot, mutating the tree in place.
///
/// The root must already be expanded from the current real observation;
/// `history` holds the episode's actions up to that root.
pub fn run_simulations(
    config: &SearchConfig,
    tree: &mut SearchTree,
    history: &ActionHistory,
    network: &dyn Network,
) -> Result<(), SearchError> {
    config.validate()?;
    if !tree.get(tree.root()).expanded() {
        return Err(SearchError::RootNotExpanded);
    }

    let mut min_max = MinMaxStats::new(config.known_bounds);
    for _ in 0..config.num_simulations {
        simulate(config, tree, history, network, &mut min_max)?;
    }
    Ok(())
}

/// One simulation: descend to a leaf, unroll the network one step, back
/// the value up along the explicit path.
fn simulate(
    config: &SearchConfig,
    tree: &mut SearchTree,
    history: &ActionHistory,
    network: &dyn Network,
    min_max: &mut MinMaxStats,
) -> Result<(), SearchError> {
    let mut scratch = history.clone();
    let mut node_id = tree.root();
    let mut path = vec![node_id];

    while tree.get(node_id).expanded() {
        let (action, child_id) = select_child(config, tree, node_id, min_max)?;
        scratch.push(action);
        path.push(child_id);
        node_id = child_id;
    }

    // The leaf's parent is expanded, so its latent state is cached.
    let parent_id = path[path.len() - 2];
    let parent_state = tree
        .get(parent_id)
        .hidden_state
        .clone()
        .expect("expanded node missing latent state");
    let action = scratch
        .last_action()
        .expect("selection pushed at least one action");

    let output = network.recurrent_inference(&parent_state, action);
    let to_play = scratch.to_play();
    tree.expand_node(node_id, to_play, &scratch.all_actions(), &output)?;

    backpropagate(config, tree, &path, output.value, to_play, min_max);
    trace!(
        depth = path.len() - 1,
        leaf_value = output.value,
        "simulation complete"
    );
    Ok(())
}

/// Pick the child maximizing the UCB score. Ties keep the earliest child,
/// i.e. the lowest index in the order actions were expanded.
fn select_child(
    config: &SearchConfig,
    tree: &SearchTree,
    id: NodeId,
    min_max: &MinMaxStats,
) -> Result<(Action, NodeId), SearchError> {
    let parent = tree.get(id);
    let mut best: Option<(f32, Action, NodeId)> = None;

    for &(action, child_id) in &parent.children {
        let score = ucb_score(config, parent, tree.get(child_id), min_max);
        if best.map_or(true, |(best_score, _, _)| score > best_score) {
            best = Some((score, action, child_id));
        }
    }

    best.map(|(_, action, child_id)| (action, child_id))
        .ok_or(SearchError::EmptySelection)
}

/// UCB score of `child` under `parent`: a prior-weighted exploration
/// bonus that decays with the child's visits, plus the child's reward and
/// discounted normalized value once it has been visited.
fn ucb_score(config: &SearchConfig, parent: &Node, child: &Node, min_max: &MinMaxStats) -> f32 {
    let parent_visits = parent.visit_count as f32;
    let mut pb_c =
        ((parent_visits + config.pb_c_base + 1.0) / config.pb_c_base).ln() + config.pb_c_init;
    pb_c *= parent_visits.sqrt() / (child.visit_count as f32 + 1.0);

    let prior_score = pb_c * child.prior;
    let value_score = if child.visit_count > 0 {
        child.reward + config.discount * min_max.normalize(child.value())
    } else {
        0.0
    };
    prior_score + value_score
}

/// Walk the path leaf-to-root: accumulate the value under each node's
/// perspective, feed the running mean into the normalizer, and fold the
/// node's reward into the value carried toward the root.
fn backpropagate(
    config: &SearchConfig,
    tree: &mut SearchTree,
    path: &[NodeId],
    leaf_value: f32,
    to_play: Player,
    min_max: &mut MinMaxStats,
) {
    let mut value = leaf_value;
    for &id in path.iter().rev() {
        let node = tree.get_mut(id);
        node.value_sum += if node.to_play == Some(to_play) {
            value
        } else {
            -value
        };
        node.visit_count += 1;
        min_max.update(node.value());
        value = node.reward + config.discount * value;
    }
}

/// Sample a move from the root's visit counts.
///
/// Temperature 0 is a deterministic arg-max; ties resolve to the earliest
/// child (lowest action index, since children are created in legal-action
/// order). Positive temperatures sample proportionally to
/// `visits^(1/temperature)`.
pub fn select_action<R: Rng>(
    tree: &SearchTree,
    temperature: f32,
    rng: &mut R,
) -> Result<Action, SearchError> {
    let visits = tree.root_visits();
    if visits.is_empty() {
        return Err(SearchError::RootNotExpanded);
    }

    if temperature <= 0.0 {
        let mut best = visits[0];
        for &(action, count) in &visits[1..] {
            if count > best.1 {
                best = (action, count);
            }
        }
        return Ok(best.0);
    }

    let weights: Vec<f64> = visits
        .iter()
        .map(|&(_, count)| (count as f64).powf(1.0 / temperature as f64))
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        // Nothing visited: fall back to the first legal action.
        return Ok(visits[0].0);
    }

    let threshold = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (&(action, _), weight) in visits.iter().zip(&weights) {
        cumulative += weight;
        if threshold < cumulative {
            return Ok(action);
        }
    }
    Ok(visits[visits.len() - 1].0)
}
