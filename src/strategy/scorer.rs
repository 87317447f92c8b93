//! Feature Scorer
//!
//! Four independent sub-scores over the smoothed series and its swings:
//! - Trend: higher highs / higher lows from the swing structure
//! - Momentum: net drift penalized by choppiness
//! - Reversal: double tops and double bottoms
//! - Support/Resistance: where price sits between the nearest levels
//!
//! Each sub-score quietly contributes 0 when there is not enough data.

use serde::{Deserialize, Serialize};

use crate::features::levels::{nearest_resistance, nearest_support};
use crate::types::{Level, PatternTag, SwingPoint, Timeframe};

/// Bound on the weighted sum
pub const RAW_SCORE_LIMIT: f64 = 8.0;

const TREND_MIN_SWINGS: usize = 4;
const TREND_LOOKBACK: usize = 10;

const MOMENTUM_MIN_POINTS: usize = 30;
const MOMENTUM_LOOKBACK: usize = 140;
const MOMENTUM_LIMIT: f64 = 1.5;

const REVERSAL_MIN_SWINGS: usize = 6;
const DOUBLE_TOLERANCE: f64 = 0.015;
const DOUBLE_WEIGHT: f64 = 1.2;

const SR_LIMIT: f64 = 1.0;

/// Linear weights applied to the four sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub trend: f64,
    pub momentum: f64,
    pub reversal: f64,
    pub sr: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            trend: 1.6,
            momentum: 0.35,
            reversal: 1.2,
            sr: 0.6,
        }
    }
}

impl Weights {
    /// Per-timeframe multipliers on (trend, momentum, reversal, sr)
    pub fn timeframe_multipliers(timeframe: Timeframe) -> [f64; 4] {
        match timeframe {
            Timeframe::Min1 => [1.0, 1.35, 1.10, 0.80],
            Timeframe::Min5 => [1.1, 1.15, 1.10, 1.00],
            Timeframe::Min30 => [1.35, 0.85, 1.00, 1.35],
        }
    }

    /// New weights scaled for `timeframe`; `self` is left untouched.
    pub fn for_timeframe(&self, timeframe: Timeframe) -> Weights {
        let [t, m, r, s] = Self::timeframe_multipliers(timeframe);
        Weights {
            trend: self.trend * t,
            momentum: self.momentum * m,
            reversal: self.reversal * r,
            sr: self.sr * s,
        }
    }
}

/// Sub-scores of one series, before weighting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubScores {
    pub trend: f64,
    pub momentum: f64,
    pub reversal: f64,
    pub sr: f64,
    pub patterns: Vec<PatternTag>,
}

impl SubScores {
    /// Weighted sum clamped to ±[`RAW_SCORE_LIMIT`]
    pub fn combine(&self, w: &Weights) -> f64 {
        let raw = w.trend * self.trend
            + w.momentum * self.momentum
            + w.reversal * self.reversal
            + w.sr * self.sr;
        raw.clamp(-RAW_SCORE_LIMIT, RAW_SCORE_LIMIT)
    }
}

/// Score a smoothed series against its swings and clustered levels.
pub fn score(series: &[f64], swings: &[SwingPoint], levels: &[Level]) -> SubScores {
    let mut patterns = Vec::new();

    let (trend, trend_tag) = trend_score(swings);
    patterns.extend(trend_tag);

    let momentum = momentum_score(series);

    let (reversal, reversal_tags) = reversal_score(swings);
    patterns.extend(reversal_tags);

    let (sr, sr_used) = match series.last() {
        Some(&last) => sr_score(last, levels),
        None => (0.0, false),
    };
    if sr_used {
        patterns.push(PatternTag::SupResUsed);
    }

    SubScores {
        trend,
        momentum,
        reversal,
        sr,
        patterns,
    }
}

/// Compare the two most recent highs and lows among the last swings.
///
/// Returns a score in [-2, 2] and the structure tag, if any.
pub fn trend_score(swings: &[SwingPoint]) -> (f64, Option<PatternTag>) {
    if swings.len() < TREND_MIN_SWINGS {
        return (0.0, None);
    }
    let tail = &swings[swings.len().saturating_sub(TREND_LOOKBACK)..];

    let highs: Vec<f64> = tail.iter().filter(|s| s.is_high).map(|s| s.value).collect();
    let lows: Vec<f64> = tail.iter().filter(|s| !s.is_high).map(|s| s.value).collect();
    let (&[.., prev_high, last_high], &[.., prev_low, last_low]) =
        (highs.as_slice(), lows.as_slice())
    else {
        return (0.0, None);
    };

    let higher_high = last_high > prev_high;
    let higher_low = last_low > prev_low;

    let score = if higher_high { 1.0 } else { -1.0 } + if higher_low { 1.0 } else { -1.0 };
    let tag = match (higher_high, higher_low) {
        (true, true) => PatternTag::HhHl,
        (false, false) => PatternTag::LhLl,
        (true, false) => PatternTag::HhLlMixed,
        (false, true) => PatternTag::LhHlMixed,
    };
    (score, Some(tag))
}

/// Net drift over the recent window minus the volatility of its steps.
pub fn momentum_score(series: &[f64]) -> f64 {
    if series.len() < MOMENTUM_MIN_POINTS {
        return 0.0;
    }
    let window = &series[series.len().saturating_sub(MOMENTUM_LOOKBACK)..];
    let (Some(&start), Some(&end)) = (window.first(), window.last()) else {
        return 0.0;
    };

    let deltas: Vec<f64> = window.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / deltas.len() as f64;
    let stdev = variance.sqrt();

    (6.0 * (end - start) - 4.0 * stdev).clamp(-MOMENTUM_LIMIT, MOMENTUM_LIMIT)
}

/// Double top (bearish) and double bottom (bullish); both may fire.
pub fn reversal_score(swings: &[SwingPoint]) -> (f64, Vec<PatternTag>) {
    let mut tags = Vec::new();
    if swings.len() < REVERSAL_MIN_SWINGS {
        return (0.0, tags);
    }

    let last_two = |is_high: bool| -> Option<(f64, f64)> {
        let mut it = swings.iter().rev().filter(|s| s.is_high == is_high);
        let last = it.next()?.value;
        let prev = it.next()?.value;
        Some((prev, last))
    };

    let mut score = 0.0;
    if let Some((h1, h2)) = last_two(true) {
        if (h2 - h1).abs() <= DOUBLE_TOLERANCE {
            score -= DOUBLE_WEIGHT;
            tags.push(PatternTag::DoubleTop);
        }
    }
    if let Some((l1, l2)) = last_two(false) {
        if (l2 - l1).abs() <= DOUBLE_TOLERANCE {
            score += DOUBLE_WEIGHT;
            tags.push(PatternTag::DoubleBottom);
        }
    }
    (score, tags)
}

/// Room above support pushes up, room below resistance pushes down.
///
/// Returns the clamped score and whether any level was used.
pub fn sr_score(last: f64, levels: &[Level]) -> (f64, bool) {
    let support = nearest_support(levels, last);
    let resistance = nearest_resistance(levels, last);

    let mut score = 0.0;
    if let Some(s) = support {
        score += 2.0 * (last - s.price) * (0.5 + s.strength);
    }
    if let Some(r) = resistance {
        score -= 2.0 * (r.price - last) * (0.5 + r.strength);
    }
    (
        score.clamp(-SR_LIMIT, SR_LIMIT),
        support.is_some() || resistance.is_some(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(index: usize, value: f64, is_high: bool) -> SwingPoint {
        SwingPoint {
            index,
            value,
            is_high,
        }
    }

    fn level(price: f64, touches: u32, is_support: bool) -> Level {
        Level {
            price,
            touches,
            strength: touches.min(10) as f64 / 10.0,
            is_support,
        }
    }

    #[test]
    fn test_trend_higher_highs_higher_lows() {
        let swings = vec![
            sp(0, 0.3, false),
            sp(5, 0.5, true),
            sp(10, 0.4, false),
            sp(15, 0.6, true),
        ];
        assert_eq!(trend_score(&swings), (2.0, Some(PatternTag::HhHl)));
    }

    #[test]
    fn test_trend_tags_cover_all_structures() {
        let down = vec![
            sp(0, 0.7, true),
            sp(5, 0.5, false),
            sp(10, 0.6, true),
            sp(15, 0.4, false),
        ];
        assert_eq!(trend_score(&down), (-2.0, Some(PatternTag::LhLl)));

        let expanding = vec![
            sp(0, 0.6, true),
            sp(5, 0.4, false),
            sp(10, 0.7, true),
            sp(15, 0.3, false),
        ];
        assert_eq!(trend_score(&expanding), (0.0, Some(PatternTag::HhLlMixed)));

        let contracting = vec![
            sp(0, 0.7, true),
            sp(5, 0.3, false),
            sp(10, 0.6, true),
            sp(15, 0.4, false),
        ];
        assert_eq!(trend_score(&contracting), (0.0, Some(PatternTag::LhHlMixed)));
    }

    #[test]
    fn test_trend_needs_enough_swings() {
        let swings = vec![sp(0, 0.3, false), sp(5, 0.5, true), sp(10, 0.4, false)];
        assert_eq!(trend_score(&swings), (0.0, None));
    }

    #[test]
    fn test_momentum_short_series_is_zero() {
        let s: Vec<f64> = (0..29).map(|i| i as f64 / 100.0).collect();
        assert_eq!(momentum_score(&s), 0.0);
    }

    #[test]
    fn test_momentum_steady_rise() {
        // constant step: zero stdev, drift 0.002 * 39
        let s: Vec<f64> = (0..40).map(|i| 0.4 + i as f64 * 0.002).collect();
        let m = momentum_score(&s);
        assert!((m - 6.0 * 0.078).abs() < 1e-9);
    }

    #[test]
    fn test_momentum_uses_recent_window_and_clamps() {
        let mut s = vec![0.0; 100];
        s.extend((0..140).map(|i| i as f64 / 139.0));
        // window starts at 0.0 and ends at 1.0
        assert_eq!(momentum_score(&s), MOMENTUM_LIMIT);
    }

    #[test]
    fn test_reversal_double_top_and_bottom() {
        let swings = vec![
            sp(0, 0.30, false),
            sp(5, 0.70, true),
            sp(10, 0.305, false),
            sp(15, 0.705, true),
            sp(20, 0.50, false),
            sp(25, 0.80, true),
        ];
        // last highs 0.705 / 0.80 differ, last lows 0.305 / 0.50 differ
        assert_eq!(reversal_score(&swings), (0.0, vec![]));

        let swings = vec![
            sp(0, 0.50, true),
            sp(5, 0.30, false),
            sp(10, 0.70, true),
            sp(15, 0.31, false),
            sp(20, 0.71, true),
            sp(25, 0.40, false),
        ];
        assert_eq!(
            reversal_score(&swings),
            (-DOUBLE_WEIGHT, vec![PatternTag::DoubleTop])
        );

        let swings = vec![
            sp(0, 0.70, true),
            sp(5, 0.30, false),
            sp(10, 0.71, true),
            sp(15, 0.31, false),
            sp(20, 0.60, true),
            sp(25, 0.30, false),
        ];
        let (score, tags) = reversal_score(&swings);
        assert_eq!(score, DOUBLE_WEIGHT);
        assert_eq!(tags, vec![PatternTag::DoubleBottom]);
    }

    #[test]
    fn test_sr_score_balances_room() {
        let levels = vec![level(0.40, 2, true), level(0.60, 2, false)];
        // symmetric room, symmetric strength
        let (score, used) = sr_score(0.50, &levels);
        assert!(score.abs() < 1e-12);
        assert!(used);

        // close to resistance: more room above support
        let (score, _) = sr_score(0.58, &levels);
        assert!(score > 0.0);

        assert_eq!(sr_score(0.5, &[]), (0.0, false));
    }

    #[test]
    fn test_combine_clamps() {
        let subs = SubScores {
            trend: 2.0,
            momentum: 1.5,
            reversal: 1.2,
            sr: 1.0,
            patterns: vec![],
        };
        let heavy = Weights {
            trend: 5.0,
            ..Weights::default()
        };
        assert_eq!(subs.combine(&heavy), RAW_SCORE_LIMIT);

        let expected = 1.6 * 2.0 + 0.35 * 1.5 + 1.2 * 1.2 + 0.6 * 1.0;
        assert!((subs.combine(&Weights::default()) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_timeframe_weights() {
        let base = Weights::default();
        let w30 = base.for_timeframe(Timeframe::Min30);
        assert!((w30.trend - 1.6 * 1.35).abs() < 1e-12);
        assert!((w30.momentum - 0.35 * 0.85).abs() < 1e-12);
        assert!((w30.sr - 0.6 * 1.35).abs() < 1e-12);

        let w1 = base.for_timeframe(Timeframe::Min1);
        assert_eq!(w1.trend, base.trend);
        assert!((w1.reversal - 1.2 * 1.10).abs() < 1e-12);

        let w5 = base.for_timeframe(Timeframe::Min5);
        assert!((w5.trend - 1.6 * 1.1).abs() < 1e-12);
        assert!((w5.momentum - 0.35 * 1.15).abs() < 1e-12);
        assert!((w5.reversal - 1.2 * 1.10).abs() < 1e-12);
        assert_eq!(w5.sr, 0.6);
        assert_eq!(base, Weights::default());
    }

    #[test]
    fn test_flat_series_scores_zero() {
        let s = vec![0.5; 200];
        let subs = score(&s, &[], &[]);
        assert_eq!(subs, SubScores::default());
    }
}
