//! Self-play actor: an unbounded episode-generation loop.
//!
//! Each actor refreshes its network snapshot before every episode, plays
//! one game, and submits the result to the replay buffer. Actors never
//! talk to each other; an arbitrarily stale snapshot is fine. A failed
//! episode is logged and skipped so a single bad search cannot take the
//! actor (let alone the pipeline) down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use reverie_core::Environment;
use reverie_mcts::SearchConfig;
use tracing::{debug, error, info, warn};

use crate::config::{PipelineConfig, TemperatureSchedule};
use crate::replay::ReplayBuffer;
use crate::selfplay::play_episode;
use crate::storage::SharedStorage;

/// Delay before retrying a failed snapshot fetch.
const FETCH_BACKOFF: Duration = Duration::from_millis(100);

pub struct Actor {
    id: usize,
    search: SearchConfig,
    temperature: TemperatureSchedule,
    max_moves: u32,
    storage: Arc<SharedStorage>,
    buffer: Arc<ReplayBuffer>,
    stop: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    rng: ChaCha20Rng,
}

impl Actor {
    /// Build an actor with its own deterministic random stream derived
    /// from the base seed and the actor index.
    pub fn new(
        id: usize,
        config: &PipelineConfig,
        storage: Arc<SharedStorage>,
        buffer: Arc<ReplayBuffer>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            search: config.search.clone(),
            temperature: config.temperature.clone(),
            max_moves: config.max_moves,
            storage,
            buffer,
            stop: Arc::new(AtomicBool::new(false)),
            shutdown,
            rng: ChaCha20Rng::seed_from_u64(config.seed.wrapping_add(1 + id as u64)),
        }
    }

    /// Handle the coordinator uses to stop this actor. Checked once per
    /// episode boundary.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.shutdown.load(Ordering::Relaxed)
    }

    /// Run until stopped. `make_env` provides a fresh environment per
    /// episode.
    pub fn run<E: Environment>(mut self, make_env: impl Fn() -> E) {
        info!(actor = self.id, "actor started");
        let mut episodes = 0u64;

        while !self.should_stop() {
            let network = match self.storage.latest_network() {
                Ok(network) => network,
                Err(e) => {
                    warn!(
                        actor = self.id,
                        error = %e,
                        "network snapshot unavailable, backing off"
                    );
                    std::thread::sleep(FETCH_BACKOFF);
                    continue;
                }
            };

            let mut env = make_env();
            match play_episode(
                &mut env,
                network.as_ref(),
                &self.search,
                &self.temperature,
                self.max_moves,
                &mut self.rng,
            ) {
                Ok(episode) => {
                    episodes += 1;
                    debug!(
                        actor = self.id,
                        steps = episode.len(),
                        reward = episode.total_reward(),
                        network_steps = network.training_steps(),
                        "episode finished"
                    );
                    self.buffer.save_episode(episode);
                }
                Err(e) => {
                    // Invariant violations abort this episode only.
                    error!(actor = self.id, error = %e, "episode aborted");
                }
            }
        }

        info!(actor = self.id, episodes, "actor stopped");
    }
}
