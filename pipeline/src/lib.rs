//! Self-play training pipeline.
//!
//! Wires the search engine into a producer/consumer loop:
//!
//! - N **actors** each run an unbounded self-play loop: fetch the latest
//!   network snapshot, drive one episode with search at every move,
//!   submit the finished episode to the shared replay buffer
//! - one **trainer** periodically checkpoints the network to shared
//!   storage, samples batches from the buffer and applies opaque
//!   optimization steps
//!
//! Actors and the trainer only meet through two shared objects: the
//! [`storage::SharedStorage`] of network snapshots (trainer writes,
//! actors read) and the [`replay::ReplayBuffer`] of episodes (actors
//! write, trainer reads). Actors tolerate arbitrarily stale snapshots;
//! the trainer's wait for buffered episodes is the only blocking point.
//!
//! [`coordinator::run_pipeline`] owns the whole arrangement and returns
//! the final checkpointed network.

pub mod actor;
pub mod config;
pub mod coordinator;
pub mod demo;
pub mod replay;
pub mod selfplay;
pub mod storage;
pub mod trainer;

pub use config::{PipelineConfig, TemperatureSchedule};
pub use coordinator::run_pipeline;
pub use replay::{Batch, BatchSample, ReplayBuffer};
pub use selfplay::play_episode;
pub use storage::SharedStorage;
pub use trainer::TrainableNetwork;
