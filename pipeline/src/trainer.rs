//! Training loop.
//!
//! Consumes batches from the replay buffer and applies optimization
//! steps to the network. The gradient computation itself is opaque: the
//! loop only drives the [`TrainableNetwork`] contract and publishes
//! checkpoints to shared storage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use reverie_core::Network;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::replay::{Batch, ReplayBuffer};
use crate::storage::SharedStorage;

/// A network the trainer can optimize.
///
/// `optimize` applies one gradient step and advances the training-step
/// counter; `snapshot` freezes the current weights into an immutable
/// checkpoint for the actors.
pub trait TrainableNetwork: Send {
    fn training_steps(&self) -> u64;

    fn optimize(&mut self, batch: Batch);

    fn snapshot(&self) -> Arc<dyn Network>;
}

/// Run the configured number of optimization steps, checkpointing every
/// `checkpoint_interval` steps and once more at the end.
///
/// The wait for buffered episodes is the loop's only blocking point; a
/// raised shutdown flag ends training early (the final checkpoint is
/// still published).
pub async fn run_training_loop(
    config: &PipelineConfig,
    network: &mut dyn TrainableNetwork,
    storage: &SharedStorage,
    buffer: &ReplayBuffer,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);

    // Progress over training steps, only when somebody is watching.
    let progress = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let pb = ProgressBar::new(config.training_steps);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} steps ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    info!(
        training_steps = config.training_steps,
        checkpoint_interval = config.checkpoint_interval,
        batch_size = config.batch_size,
        "training loop started"
    );

    'steps: for step in 0..config.training_steps {
        if shutdown.load(Ordering::Relaxed) {
            info!(step, "shutdown requested, stopping training early");
            break;
        }

        if step % config.checkpoint_interval == 0 {
            storage.save_network(network.training_steps(), network.snapshot())?;
        }

        // Block until the actors have produced something to learn from,
        // staying responsive to shutdown.
        while buffer.is_empty() {
            if shutdown.load(Ordering::Relaxed) {
                info!(step, "shutdown requested while waiting for episodes");
                break 'steps;
            }
            let _ = tokio::time::timeout(
                Duration::from_millis(50),
                buffer.wait_for_episodes(1),
            )
            .await;
        }

        let batch = buffer.sample_batch(
            config.batch_size,
            config.unroll_steps,
            config.td_steps,
            config.search.discount,
            &mut rng,
        );
        network.optimize(batch);

        debug!(step, buffered = buffer.len(), "optimization step applied");
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    storage.save_network(network.training_steps(), network.snapshot())?;
    if let Some(pb) = progress {
        pb.finish_with_message("training complete");
    }
    info!(
        final_steps = network.training_steps(),
        "training loop finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::UniformTrainable;
    use reverie_core::{Action, Episode, Player, UniformNetwork};

    fn short_config(steps: u64) -> PipelineConfig {
        PipelineConfig {
            training_steps: steps,
            checkpoint_interval: 2,
            batch_size: 4,
            window_size: 8,
            ..Default::default()
        }
    }

    fn seeded_buffer() -> ReplayBuffer {
        let buffer = ReplayBuffer::new(8);
        let mut episode = Episode::new();
        for i in 0..4 {
            episode.record_step(
                vec![i as f32],
                Player(i % 2),
                Action(i % 2),
                0.0,
                vec![0.5, 0.5],
                0.0,
            );
        }
        buffer.save_episode(episode);
        buffer
    }

    #[tokio::test]
    async fn trainer_runs_all_steps_and_checkpoints() {
        let config = short_config(6);
        let mut network = UniformTrainable::new(2, 4);
        let storage = SharedStorage::new(Arc::new(UniformNetwork::new(2, 4)));
        let buffer = seeded_buffer();
        let shutdown = AtomicBool::new(false);

        run_training_loop(&config, &mut network, &storage, &buffer, &shutdown)
            .await
            .unwrap();

        assert_eq!(network.training_steps(), 6);
        assert_eq!(storage.latest_network().unwrap().training_steps(), 6);
        // Checkpoints at steps 0, 2, 4 plus the final one.
        assert_eq!(storage.len(), 4);
    }

    #[tokio::test]
    async fn raised_shutdown_stops_training_immediately() {
        let config = short_config(100);
        let mut network = UniformTrainable::new(2, 4);
        let storage = SharedStorage::new(Arc::new(UniformNetwork::new(2, 4)));
        let buffer = seeded_buffer();
        let shutdown = AtomicBool::new(true);

        run_training_loop(&config, &mut network, &storage, &buffer, &shutdown)
            .await
            .unwrap();

        assert_eq!(network.training_steps(), 0);
        // The final checkpoint is still published.
        assert_eq!(storage.latest_network().unwrap().training_steps(), 0);
    }
}
