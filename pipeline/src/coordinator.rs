//! Pipeline coordinator.
//!
//! Owns the shared storage and replay buffer, launches the actor fleet
//! and the training loop, and tears everything down once training
//! completes. The final checkpointed network is the pipeline's output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use reverie_core::{Environment, Network};
use tracing::{error, info};

use crate::actor::Actor;
use crate::config::PipelineConfig;
use crate::replay::ReplayBuffer;
use crate::storage::SharedStorage;
use crate::trainer::{run_training_loop, TrainableNetwork};

/// Run the full pipeline: N self-play actors against one training loop.
///
/// `make_env` supplies a fresh environment per episode. The `shutdown`
/// flag is honored by every task at its next safe point (episode
/// boundary for actors, step boundary for the trainer); the pipeline
/// still publishes a final checkpoint on early shutdown.
pub async fn run_pipeline<T, E, F>(
    config: PipelineConfig,
    mut network: T,
    make_env: F,
    shutdown: Arc<AtomicBool>,
) -> Result<Arc<dyn Network>>
where
    T: TrainableNetwork,
    E: Environment + 'static,
    F: Fn() -> E + Send + Sync + 'static,
{
    config.validate()?;

    let storage = Arc::new(SharedStorage::new(network.snapshot()));
    let buffer = Arc::new(ReplayBuffer::new(config.window_size));
    let make_env = Arc::new(make_env);

    // Search is pure computation, so each actor gets a blocking task of
    // its own rather than a slot on the async workers.
    let mut stop_flags = Vec::with_capacity(config.num_actors);
    let mut handles = Vec::with_capacity(config.num_actors);
    for id in 0..config.num_actors {
        let actor = Actor::new(
            id,
            &config,
            Arc::clone(&storage),
            Arc::clone(&buffer),
            Arc::clone(&shutdown),
        );
        stop_flags.push(actor.stop_flag());
        let make_env = Arc::clone(&make_env);
        handles.push(tokio::task::spawn_blocking(move || {
            actor.run(move || (*make_env)())
        }));
    }
    info!(actors = config.num_actors, "self-play actors launched");

    let result = run_training_loop(&config, &mut network, &storage, &buffer, &shutdown).await;

    // Training is done (or failed): wind the actors down either way.
    for flag in &stop_flags {
        flag.store(true, Ordering::Relaxed);
    }
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "actor task panicked");
        }
    }
    result?;

    info!(
        episodes = buffer.total_saved(),
        checkpoints = storage.len(),
        "pipeline finished"
    );
    storage.latest_network()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemperatureSchedule;
    use crate::demo::{RaceGame, UniformTrainable};
    use reverie_mcts::SearchConfig;
    use std::time::Duration;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            num_actors: 2,
            training_steps: 12,
            checkpoint_interval: 4,
            batch_size: 8,
            window_size: 32,
            max_moves: 64,
            unroll_steps: 3,
            td_steps: 5,
            seed: 7,
            search: SearchConfig::for_testing().with_simulations(8),
            temperature: TemperatureSchedule::Constant { value: 1.0 },
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pipeline_runs_to_completion() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let network = UniformTrainable::new(2, 4);

        let final_network = tokio::time::timeout(
            Duration::from_secs(60),
            run_pipeline(small_config(), network, || RaceGame::new(10), shutdown),
        )
        .await
        .expect("pipeline timed out")
        .unwrap();

        assert_eq!(final_network.training_steps(), 12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn pre_raised_shutdown_short_circuits() {
        let shutdown = Arc::new(AtomicBool::new(true));
        let network = UniformTrainable::new(2, 4);

        let final_network = tokio::time::timeout(
            Duration::from_secs(60),
            run_pipeline(small_config(), network, || RaceGame::new(10), shutdown),
        )
        .await
        .expect("pipeline timed out")
        .unwrap();

        // No optimization steps ran, but the final checkpoint exists.
        assert_eq!(final_network.training_steps(), 0);
    }
}
