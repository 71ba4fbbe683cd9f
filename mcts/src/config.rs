//! Search configuration parameters.

use serde::{Deserialize, Serialize};

use crate::bounds::KnownBounds;
use crate::search::SearchError;

/// Configuration for one search engine instance.
///
/// The UCB exploration constant follows
/// `c = pb_c_init + ln((N + pb_c_base + 1) / pb_c_base)`, growing slowly
/// with the parent's visit count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Simulations per decision point.
    pub num_simulations: u32,

    /// UCB exploration growth base.
    pub pb_c_base: f32,

    /// UCB exploration constant at low visit counts.
    pub pb_c_init: f32,

    /// Discount applied to values carried toward the root and to value
    /// targets. 1.0 for board games, below 1 for long-horizon domains.
    pub discount: f32,

    /// Dirichlet concentration for root exploration noise. Zero disables
    /// the noise.
    pub root_dirichlet_alpha: f32,

    /// Fraction of each root prior replaced by noise.
    pub root_exploration_fraction: f32,

    /// Fixed value bounds when known; otherwise the range is learned per
    /// search.
    pub known_bounds: Option<KnownBounds>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_simulations: 800,
            pb_c_base: 19652.0,
            pb_c_init: 1.25,
            discount: 1.0,
            root_dirichlet_alpha: 0.3,
            root_exploration_fraction: 0.25,
            known_bounds: None,
        }
    }
}

impl SearchConfig {
    /// Small, noise-free config for tests.
    pub fn for_testing() -> Self {
        Self {
            num_simulations: 50,
            root_dirichlet_alpha: 0.0,
            root_exploration_fraction: 0.0,
            ..Default::default()
        }
    }

    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    pub fn with_known_bounds(mut self, bounds: KnownBounds) -> Self {
        self.known_bounds = Some(bounds);
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.num_simulations == 0 {
            return Err(SearchError::InvalidConfig(
                "num_simulations must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.root_exploration_fraction) {
            return Err(SearchError::InvalidConfig(
                "root_exploration_fraction must lie in [0, 1]".into(),
            ));
        }
        if self.discount <= 0.0 {
            return Err(SearchError::InvalidConfig(
                "discount must be positive".into(),
            ));
        }
        if let Some(bounds) = self.known_bounds {
            if bounds.max < bounds.min {
                return Err(SearchError::InvalidBounds {
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(())
    }
}
