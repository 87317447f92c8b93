//! Type 2 breakout detector
//!
//! A consolidation under resistance followed by a close that clears it,
//! with an uptrend already in place.

use crate::types::{BreakoutSignal, Level};

const MIN_POINTS: usize = 25;
const MIN_TREND: f64 = 0.5;

/// Bars inspected before the current close
const BASE_BARS: usize = 12;
/// Share of base bars that must sit under the level
const BASE_RATIO: f64 = 0.65;
/// A base bar counts as "under" at or below `resistance - BASE_BUFFER`
const BASE_BUFFER: f64 = 0.003;
/// Minimum clearance of the current close over resistance
const CLEAR_MARGIN: f64 = 0.008;

/// Distance that saturates the clearance and follow-through terms
const SCORE_SPAN: f64 = 0.05;
const FOLLOW_THROUGH_BARS: usize = 6;

/// Check the raw close series for a Type 2 breakout over the resistance
/// levels in `levels`.
pub fn detect_breakout(closes: &[f64], levels: &[Level], trend_score: f64) -> BreakoutSignal {
    let n = closes.len();
    if n < MIN_POINTS || trend_score < MIN_TREND {
        return BreakoutSignal::default();
    }
    let last = closes[n - 1];

    let Some(resistance) = target_resistance(levels, last) else {
        return BreakoutSignal::default();
    };

    let base = &closes[n - 1 - BASE_BARS..n - 1];
    let under = base
        .iter()
        .filter(|&&c| c <= resistance - BASE_BUFFER)
        .count();
    if (under as f64) < BASE_RATIO * BASE_BARS as f64 {
        return BreakoutSignal::default();
    }
    if last - resistance < CLEAR_MARGIN {
        return BreakoutSignal::default();
    }

    let unit = |x: f64| x.clamp(0.0, 1.0);
    let clearance = unit((last - resistance) / SCORE_SPAN);
    let follow_through = unit((last - closes[n - FOLLOW_THROUGH_BARS]) / SCORE_SPAN);
    let trend = unit(trend_score / 2.0);
    let score = unit(0.55 * clearance + 0.30 * follow_through + 0.15 * trend);

    tracing::debug!(resistance, last, score, "Type 2 breakout");

    BreakoutSignal {
        fired: true,
        score,
        level: resistance,
    }
}

/// Nearest resistance at or above `last`, else the highest known one.
fn target_resistance(levels: &[Level], last: f64) -> Option<f64> {
    let resistances = levels.iter().filter(|l| !l.is_support).map(|l| l.price);
    resistances
        .clone()
        .filter(|&p| p >= last)
        .min_by(f64::total_cmp)
        .or_else(|| resistances.max_by(f64::total_cmp))
}
