//! Support/resistance clustering
//!
//! Single pass over the swing list: each swing either joins the first
//! same-side level within [`LEVEL_TOLERANCE`] or opens a new one.

use crate::types::{Level, SwingPoint};

/// Distance within which a swing joins an existing level
pub const LEVEL_TOLERANCE: f64 = 0.012;
/// Levels kept after clustering
pub const MAX_LEVELS: usize = 6;
/// Touch count at which strength saturates
const MAX_TOUCHES_FOR_STRENGTH: u32 = 10;

/// Weight of the existing level price when a swing merges in
const MERGE_KEEP: f64 = 0.7;

pub fn cluster(swings: &[SwingPoint]) -> Vec<Level> {
    let mut levels: Vec<Level> = Vec::new();

    for sp in swings {
        let is_support = !sp.is_high;
        let existing = levels
            .iter_mut()
            .find(|l| l.is_support == is_support && (l.price - sp.value).abs() <= LEVEL_TOLERANCE);

        match existing {
            Some(level) => {
                level.price = MERGE_KEEP * level.price + (1.0 - MERGE_KEEP) * sp.value;
                level.touches += 1;
            }
            None => levels.push(Level {
                price: sp.value,
                touches: 1,
                strength: 0.0,
                is_support,
            }),
        }
    }

    for level in levels.iter_mut() {
        level.strength = level.touches.min(MAX_TOUCHES_FOR_STRENGTH) as f64
            / MAX_TOUCHES_FOR_STRENGTH as f64;
    }

    // stable: ties keep discovery order
    levels.sort_by(|a, b| b.touches.cmp(&a.touches));
    levels.truncate(MAX_LEVELS);
    levels.sort_by(|a, b| a.price.total_cmp(&b.price));
    levels
}

/// Split into (support, resistance), both ascending.
pub fn partition(levels: &[Level]) -> (Vec<Level>, Vec<Level>) {
    levels.iter().copied().partition(|l| l.is_support)
}

/// Highest support level at or below `price`
pub fn nearest_support(levels: &[Level], price: f64) -> Option<&Level> {
    levels
        .iter()
        .filter(|l| l.is_support && l.price <= price)
        .max_by(|a, b| a.price.total_cmp(&b.price))
}

/// Lowest resistance level at or above `price`
pub fn nearest_resistance(levels: &[Level], price: f64) -> Option<&Level> {
    levels
        .iter()
        .filter(|l| !l.is_support && l.price >= price)
        .min_by(|a, b| a.price.total_cmp(&b.price))
}
