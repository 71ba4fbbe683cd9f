//! Episode driver: one full self-play game against a frozen network.
//!
//! Each move gets a fresh search tree rooted at the current real
//! observation. The tree is discarded as soon as an action is chosen;
//! only the root's visit distribution and value survive into the episode
//! record.

use rand::Rng;
use reverie_core::{ActionHistory, Environment, Episode, Network};
use reverie_mcts::{run_simulations, select_action, SearchConfig, SearchError, SearchTree};
use tracing::trace;

use crate::config::TemperatureSchedule;

/// Drive one episode to termination or the move cap.
///
/// The environment must start non-terminal; search is never invoked on a
/// terminal state.
pub fn play_episode<E: Environment, R: Rng>(
    env: &mut E,
    network: &dyn Network,
    search: &SearchConfig,
    temperature: &TemperatureSchedule,
    max_moves: u32,
    rng: &mut R,
) -> Result<Episode, SearchError> {
    let mut episode = Episode::new();
    let mut history = ActionHistory::new(env.action_space(), env.num_players());
    let training_steps = network.training_steps();
    let mut num_moves = 0u32;

    while !env.is_terminal() && num_moves < max_moves {
        let observation = env.observation();
        let to_play = env.to_play();

        let mut tree = SearchTree::new();
        let output = network.initial_inference(&observation);
        tree.expand_root(to_play, &env.legal_actions(), &output)?;
        tree.add_exploration_noise(
            search.root_dirichlet_alpha,
            search.root_exploration_fraction,
            rng,
        );

        run_simulations(search, &mut tree, &history, network)?;

        let t = temperature.temperature(num_moves, training_steps);
        let action = select_action(&tree, t, rng)?;
        let reward = env.apply(action);
        history.push(action);

        trace!(
            move_number = num_moves,
            action = action.index(),
            temperature = t,
            "move played"
        );
        episode.record_step(
            observation,
            to_play,
            action,
            reward,
            tree.root_visit_distribution(env.action_space()),
            tree.root_value(),
        );
        num_moves += 1;
    }

    Ok(episode)
}
