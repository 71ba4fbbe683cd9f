//! Pipeline configuration.
//!
//! Loaded from `config.toml` with every field defaulted, so a partial or
//! absent file works. `REVERIE_*` environment variables override file
//! values; CLI flags (handled in the binary) take highest priority.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use reverie_mcts::SearchConfig;

mod defaults {
    pub const NUM_ACTORS: usize = 4;
    pub const TRAINING_STEPS: u64 = 1000;
    pub const CHECKPOINT_INTERVAL: u64 = 100;
    pub const BATCH_SIZE: usize = 64;
    pub const WINDOW_SIZE: usize = 1000;
    pub const MAX_MOVES: u32 = 512;
    pub const UNROLL_STEPS: usize = 5;
    pub const TD_STEPS: usize = 10;
    pub const SEED: u64 = 0;
    pub const LOG_LEVEL: &str = "info";
}

/// Softmax temperature as a function of the move number and the
/// network's training-step counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemperatureSchedule {
    /// Same temperature for every move.
    Constant { value: f32 },

    /// Board-game style: explore for the opening, then play greedily.
    MoveCutoff {
        cutoff: u32,
        before: f32,
        after: f32,
    },

    /// Anneal as training progresses: the temperature of the last
    /// boundary whose step count the checkpoint counter has reached,
    /// else `initial`.
    StepDecay {
        initial: f32,
        boundaries: Vec<(u64, f32)>,
    },
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        TemperatureSchedule::MoveCutoff {
            cutoff: 30,
            before: 1.0,
            after: 0.0,
        }
    }
}

impl TemperatureSchedule {
    pub fn temperature(&self, num_moves: u32, training_steps: u64) -> f32 {
        match self {
            TemperatureSchedule::Constant { value } => *value,
            TemperatureSchedule::MoveCutoff {
                cutoff,
                before,
                after,
            } => {
                if num_moves < *cutoff {
                    *before
                } else {
                    *after
                }
            }
            TemperatureSchedule::StepDecay {
                initial,
                boundaries,
            } => boundaries
                .iter()
                .filter(|(step, _)| training_steps >= *step)
                .map(|(_, value)| *value)
                .last()
                .unwrap_or(*initial),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent self-play actors.
    pub num_actors: usize,

    /// Optimization steps the trainer runs before the pipeline finishes.
    pub training_steps: u64,

    /// Steps between checkpoints published to shared storage.
    pub checkpoint_interval: u64,

    /// Positions per training batch.
    pub batch_size: usize,

    /// Episodes kept in the replay window.
    pub window_size: usize,

    /// Hard cap on episode length.
    pub max_moves: u32,

    /// Positions unrolled per training sample.
    pub unroll_steps: usize,

    /// Bootstrap horizon for value targets.
    pub td_steps: usize,

    /// Base seed; actors and the trainer derive their own streams from it.
    pub seed: u64,

    /// Log level for the binary (trace, debug, info, warn, error).
    pub log_level: String,

    pub search: SearchConfig,

    pub temperature: TemperatureSchedule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_actors: defaults::NUM_ACTORS,
            training_steps: defaults::TRAINING_STEPS,
            checkpoint_interval: defaults::CHECKPOINT_INTERVAL,
            batch_size: defaults::BATCH_SIZE,
            window_size: defaults::WINDOW_SIZE,
            max_moves: defaults::MAX_MOVES,
            unroll_steps: defaults::UNROLL_STEPS,
            td_steps: defaults::TD_STEPS,
            seed: defaults::SEED,
            log_level: defaults::LOG_LEVEL.into(),
            search: SearchConfig::default(),
            temperature: TemperatureSchedule::default(),
        }
    }
}

/// Standard locations to search for config.toml.
const CONFIG_SEARCH_PATHS: &[&str] = &["config.toml", "../config.toml"];

impl PipelineConfig {
    /// Load configuration: explicit path, `REVERIE_CONFIG`, the standard
    /// search paths, or built-in defaults, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let config = Self::from_path(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            return Ok(apply_env_overrides(config));
        }

        if let Ok(path) = std::env::var("REVERIE_CONFIG") {
            let path = PathBuf::from(&path);
            if path.exists() {
                info!("loading config from REVERIE_CONFIG: {}", path.display());
                let config = Self::from_path(&path)?;
                return Ok(apply_env_overrides(config));
            }
            warn!(
                "REVERIE_CONFIG={} not found, searching defaults",
                path.display()
            );
        }

        for path_str in CONFIG_SEARCH_PATHS {
            let path = PathBuf::from(path_str);
            if path.exists() {
                info!("loading config from {}", path.display());
                let config = Self::from_path(&path)?;
                return Ok(apply_env_overrides(config));
            }
        }

        Ok(apply_env_overrides(Self::default()))
    }

    fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_actors == 0 {
            bail!("num_actors must be at least 1");
        }
        if self.training_steps == 0 {
            bail!("training_steps must be at least 1");
        }
        if self.checkpoint_interval == 0 {
            bail!("checkpoint_interval must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.window_size == 0 {
            bail!("window_size must be at least 1");
        }
        if self.max_moves == 0 {
            bail!("max_moves must be at least 1");
        }
        if self.log_level.parse::<LevelFilter>().is_err() {
            bail!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            );
        }
        self.search
            .validate()
            .context("invalid search configuration")?;
        Ok(())
    }
}

/// Apply `REVERIE_*` environment overrides for the scalar fields.
macro_rules! env_override {
    ($config:expr, $field:ident, $key:expr) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$field = v;
        }
    };
}

fn apply_env_overrides(mut config: PipelineConfig) -> PipelineConfig {
    env_override!(config, num_actors, "REVERIE_NUM_ACTORS");
    env_override!(config, training_steps, "REVERIE_TRAINING_STEPS");
    env_override!(config, checkpoint_interval, "REVERIE_CHECKPOINT_INTERVAL");
    env_override!(config, batch_size, "REVERIE_BATCH_SIZE");
    env_override!(config, window_size, "REVERIE_WINDOW_SIZE");
    env_override!(config, max_moves, "REVERIE_MAX_MOVES");
    env_override!(config, unroll_steps, "REVERIE_UNROLL_STEPS");
    env_override!(config, td_steps, "REVERIE_TD_STEPS");
    env_override!(config, seed, "REVERIE_SEED");
    if let Ok(v) = std::env::var("REVERIE_LOG_LEVEL") {
        config.log_level = v;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let config: PipelineConfig = toml::from_str(
            r#"
num_actors = 2
training_steps = 50

[search]
num_simulations = 25
"#,
        )
        .unwrap();

        assert_eq!(config.num_actors, 2);
        assert_eq!(config.training_steps, 50);
        assert_eq!(config.search.num_simulations, 25);
        assert_eq!(config.batch_size, defaults::BATCH_SIZE);
        assert!((config.search.pb_c_init - 1.25).abs() < 1e-6);
    }

    #[test]
    fn temperature_schedule_parses_from_toml() {
        let config: PipelineConfig = toml::from_str(
            r#"
[temperature]
kind = "move_cutoff"
cutoff = 10
before = 1.0
after = 0.25
"#,
        )
        .unwrap();

        assert!((config.temperature.temperature(9, 0) - 1.0).abs() < 1e-6);
        assert!((config.temperature.temperature(10, 0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn move_cutoff_switches_exactly_at_cutoff() {
        let schedule = TemperatureSchedule::default();
        assert!((schedule.temperature(0, 0) - 1.0).abs() < 1e-6);
        assert!((schedule.temperature(29, 0) - 1.0).abs() < 1e-6);
        assert!(schedule.temperature(30, 0).abs() < 1e-6);
        assert!(schedule.temperature(100, 0).abs() < 1e-6);
    }

    #[test]
    fn step_decay_follows_the_checkpoint_counter() {
        let schedule = TemperatureSchedule::StepDecay {
            initial: 1.0,
            boundaries: vec![(100, 0.5), (200, 0.25)],
        };

        assert!((schedule.temperature(0, 0) - 1.0).abs() < 1e-6);
        assert!((schedule.temperature(0, 99) - 1.0).abs() < 1e-6);
        assert!((schedule.temperature(0, 100) - 0.5).abs() < 1e-6);
        assert!((schedule.temperature(0, 500) - 0.25).abs() < 1e-6);
        // Move number is irrelevant for this schedule.
        assert!((schedule.temperature(400, 150) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn validate_rejects_zero_actors() {
        let config = PipelineConfig {
            num_actors: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("num_actors"));
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let config = PipelineConfig {
            log_level: "nope".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_surfaces_search_errors() {
        let mut config = PipelineConfig::default();
        config.search.num_simulations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_take_effect() {
        std::env::set_var("REVERIE_NUM_ACTORS", "9");
        std::env::set_var("REVERIE_SEED", "1234");

        let config = apply_env_overrides(PipelineConfig::default());
        assert_eq!(config.num_actors, 9);
        assert_eq!(config.seed, 1234);

        std::env::remove_var("REVERIE_NUM_ACTORS");
        std::env::remove_var("REVERIE_SEED");
    }
}
