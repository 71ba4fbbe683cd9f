//! In-memory replay buffer.
//!
//! Actors append finished episodes; the trainer samples batches. The
//! buffer keeps a bounded window of the most recent episodes, evicting
//! the oldest on overflow. Writes are cheap and never block on the
//! trainer; the trainer's wait for a minimum fill level is the
//! pipeline's only blocking point.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rand::Rng;
use reverie_core::{Action, Episode, Observation, Target};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// One training sample: the observation at a sampled position, the
/// actions actually taken from there, and per-position targets.
#[derive(Debug, Clone)]
pub struct BatchSample {
    pub observation: Observation,
    pub actions: Vec<Action>,
    pub targets: Vec<Target>,
}

pub type Batch = Vec<BatchSample>;

pub struct ReplayBuffer {
    window_size: usize,
    episodes: Mutex<VecDeque<Episode>>,
    notify: Notify,
    total_saved: AtomicU64,
}

impl ReplayBuffer {
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "window_size must be positive");
        Self {
            window_size,
            episodes: Mutex::new(VecDeque::with_capacity(window_size)),
            notify: Notify::new(),
            total_saved: AtomicU64::new(0),
        }
    }

    /// Append a finished episode, evicting the oldest once the window is
    /// full. Empty episodes carry no training signal and are dropped.
    pub fn save_episode(&self, episode: Episode) {
        if episode.is_empty() {
            warn!("discarding empty episode");
            return;
        }

        {
            let mut episodes = self.episodes.lock().expect("replay buffer lock poisoned");
            if episodes.len() == self.window_size {
                episodes.pop_front();
            }
            episodes.push_back(episode);
        }
        let total = self.total_saved.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(total, "episode buffered");
        self.notify.notify_waiters();
    }

    /// Episodes currently buffered.
    pub fn len(&self) -> usize {
        self.episodes.lock().expect("replay buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Episodes ever saved, including evicted ones.
    pub fn total_saved(&self) -> u64 {
        self.total_saved.load(Ordering::Relaxed)
    }

    /// Block until at least `min` episodes are buffered.
    pub async fn wait_for_episodes(&self, min: usize) {
        loop {
            let notified = self.notify.notified();
            if self.len() >= min {
                return;
            }
            notified.await;
        }
    }

    /// Sample `batch_size` positions uniformly over buffered episodes and
    /// positions, together with `unroll_steps` actions and targets
    /// bootstrapped `td_steps` ahead.
    pub fn sample_batch<R: Rng>(
        &self,
        batch_size: usize,
        unroll_steps: usize,
        td_steps: usize,
        discount: f32,
        rng: &mut R,
    ) -> Batch {
        let episodes = self.episodes.lock().expect("replay buffer lock poisoned");
        if episodes.is_empty() {
            return Vec::new();
        }

        (0..batch_size)
            .map(|_| {
                let episode = &episodes[rng.gen_range(0..episodes.len())];
                let position = rng.gen_range(0..episode.len());
                BatchSample {
                    observation: episode.observation(position).clone(),
                    actions: episode.unroll_actions(position, unroll_steps),
                    targets: episode.make_targets(position, unroll_steps, td_steps, discount),
                }
            })
            .collect()
    }
}
