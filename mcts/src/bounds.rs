//! Running value bounds used to normalize backed-up values.
//!
//! UCB mixes a prior-weighted exploration bonus with a value score. The
//! bonus lives in [0, 1]; backed-up values live in whatever range the
//! game's rewards produce. This tracker rescales them into the unit
//! interval using either caller-supplied fixed bounds or the range
//! observed so far in the current tree.

use serde::{Deserialize, Serialize};

/// Fixed value range supplied by the caller when the game's value bounds
/// are known up front (e.g. -1..1 for win/loss games).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnownBounds {
    pub min: f32,
    pub max: f32,
}

/// Min/max statistics over the mean values seen during one search.
///
/// Scoped to a single tree: recreated at every decision point.
#[derive(Debug, Clone)]
pub struct MinMaxStats {
    minimum: f32,
    maximum: f32,
}

impl MinMaxStats {
    /// Start from known bounds, or from sentinel values meaning "nothing
    /// observed yet".
    pub fn new(known_bounds: Option<KnownBounds>) -> Self {
        match known_bounds {
            Some(bounds) => Self {
                minimum: bounds.min,
                maximum: bounds.max,
            },
            None => Self {
                minimum: f32::INFINITY,
                maximum: f32::NEG_INFINITY,
            },
        }
    }

    /// Widen the range to include `value`.
    pub fn update(&mut self, value: f32) {
        self.minimum = self.minimum.min(value);
        self.maximum = self.maximum.max(value);
    }

    /// Map `value` into [0, 1] using the current range. With a zero-width
    /// (or not yet observed) range the value is returned unchanged.
    pub fn normalize(&self, value: f32) -> f32 {
        if self.maximum > self.minimum {
            (value - self.minimum) / (self.maximum - self.minimum)
        } else {
            value
        }
    }
}
