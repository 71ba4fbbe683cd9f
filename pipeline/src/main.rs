//! reverie - self-play training pipeline.
//!
//! Runs the full loop against the built-in demo game: self-play actors
//! generating episodes with latent-space search, a replay buffer, and a
//! training loop publishing checkpoints. Real deployments swap the demo
//! environment and network for their own implementations of the
//! `Environment` and `TrainableNetwork` contracts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::info;

use reverie_pipeline::demo::{RaceGame, UniformTrainable};
use reverie_pipeline::{run_pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "reverie")]
#[command(about = "Self-play training pipeline driven by latent-space search")]
#[command(
    long_about = "Runs concurrent self-play actors against a shared replay buffer and a
training loop that periodically republishes network checkpoints.

Configuration is loaded from config.toml with REVERIE_* environment
variable overrides. CLI flags take highest priority."
)]
struct Cli {
    /// Path to config.toml (standard search paths when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of self-play actors
    #[arg(long)]
    actors: Option<usize>,

    /// Override the number of training steps
    #[arg(long)]
    training_steps: Option<u64>,

    /// Override the base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Target score of the built-in demo game
    #[arg(long, default_value_t = 20)]
    race_target: u32,
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(actors) = cli.actors {
        config.num_actors = actors;
    }
    if let Some(steps) = cli.training_steps {
        config.training_steps = steps;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    init_tracing(&config.log_level);
    info!(
        actors = config.num_actors,
        training_steps = config.training_steps,
        simulations = config.search.num_simulations,
        seed = config.seed,
        "starting pipeline"
    );

    // Ctrl-C raises the shutdown flag; every task honors it at its next
    // episode or step boundary.
    let shutdown = Arc::new(AtomicBool::new(false));
    let signal_flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_flag.store(true, Ordering::Relaxed);
        }
    });

    let network = UniformTrainable::new(2, 8);
    let target = cli.race_target;
    let final_network =
        run_pipeline(config, network, move || RaceGame::new(target), shutdown).await?;

    info!(
        training_steps = final_network.training_steps(),
        "final checkpoint ready"
    );
    Ok(())
}
