//! Feature Engine - Structure features of an extracted close series
//!
//! Computes, in order:
//! - Smoothed series (edge-clamped moving average)
//! - Swing highs/lows with noise reduction
//! - Support/resistance levels clustered from the swings
//!
//! Also hosts the session clock used to scale scores by time of day.

pub mod levels;
pub mod session;
pub mod smoothing;
pub mod swings;

pub use levels::{cluster, nearest_resistance, nearest_support, partition};
pub use session::{time_to_minutes, SessionTime};
pub use smoothing::smooth;
pub use swings::{clean_swings, find_swings};

use crate::types::{Level, NormalizedSeries, SwingPoint};

/// Everything derived from one close series
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartFeatures {
    pub smoothed: NormalizedSeries,
    pub swings: Vec<SwingPoint>,
    /// Ascending by price, at most [`levels::MAX_LEVELS`]
    pub levels: Vec<Level>,
}

impl ChartFeatures {
    /// Last smoothed value, 0.5 when the series is empty
    pub fn last_price(&self) -> f64 {
        self.smoothed.last().copied().unwrap_or(0.5)
    }
}

/// Window sizes for the structure pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEngine {
    pub smoothing_window: usize,
    pub swing_window: usize,
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            swing_window: 8,
        }
    }
}

impl FeatureEngine {
    pub fn new(smoothing_window: usize, swing_window: usize) -> Self {
        Self {
            smoothing_window,
            swing_window,
        }
    }

    pub fn compute(&self, closes: &[f64]) -> ChartFeatures {
        let smoothed = smooth(closes, self.smoothing_window);
        let swings = find_swings(&smoothed, self.swing_window);
        let levels = cluster(&swings);

        tracing::debug!(
            points = smoothed.len(),
            swings = swings.len(),
            levels = levels.len(),
            "Computed chart features"
        );

        ChartFeatures {
            smoothed,
            swings,
            levels,
        }
    }
}
