//! Multi-timeframe fusion
//!
//! Runs the 1m, 5m and 30m charts independently, then locks the final call
//! to the higher timeframe unless the 5m chart disagrees with it.

use serde::{Deserialize, Serialize};

use super::{analyze_closes, calibrator, EngineConfig, PredictionContext};
use crate::extraction::extract_close;
use crate::risk::TradePlanner;
use crate::types::{
    Bias, BuyType, FeatureBreakdown, Level, PixelGrid, Prediction, SignalTier, Timeframe,
    TimeframeFlags, TradePlan,
};

/// Leg weights of the fused probability and confidence (1m, 5m, 30m)
const LEG_WEIGHTS: [f64; 3] = [0.2, 0.3, 0.5];
/// Bullish legs needed before a fused call can carry a trade signal
const MIN_CONFLUENCE: u8 = 2;

/// Fused call plus the three single-timeframe legs (1m, 5m, 30m)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframeResult {
    pub fused: Prediction,
    pub legs: [Prediction; 3],
}

impl MultiTimeframeResult {
    pub fn leg(&self, timeframe: Timeframe) -> &Prediction {
        match timeframe {
            Timeframe::Min1 => &self.legs[0],
            Timeframe::Min5 => &self.legs[1],
            Timeframe::Min30 => &self.legs[2],
        }
    }
}

/// Analyze three charts in 1m, 5m, 30m order and fuse them.
pub fn run_multi_timeframe<G: PixelGrid + ?Sized>(
    config: &EngineConfig,
    grids: [&G; 3],
    ctx: &PredictionContext,
) -> MultiTimeframeResult {
    let legs = Timeframe::ALL.map(|tf| {
        let grid = grids[leg_index(tf)];
        let closes = extract_close(grid, &config.colors);
        let leg_ctx = PredictionContext {
            timeframe: Some(tf),
            scale: None,
            ..*ctx
        };
        analyze_closes(config, &closes, &leg_ctx)
    });

    let mut fused = fuse(config, &legs);
    let mut legs = legs;
    if let Some(scale) = &ctx.scale {
        scale.apply(&mut fused);
        for leg in legs.iter_mut() {
            scale.apply(leg);
        }
    }
    MultiTimeframeResult { fused, legs }
}

fn leg_index(timeframe: Timeframe) -> usize {
    match timeframe {
        Timeframe::Min1 => 0,
        Timeframe::Min5 => 1,
        Timeframe::Min30 => 2,
    }
}

fn blend(values: [f64; 3]) -> f64 {
    values
        .iter()
        .zip(LEG_WEIGHTS.iter())
        .map(|(v, w)| v * w)
        .sum()
}

/// Bias-locked label from the three leg labels.
pub fn fused_label(l1: Bias, l5: Bias, l30: Bias) -> Bias {
    let bias = if l30.is_neutral() { l5 } else { l30 };
    if bias.is_neutral() {
        if l1 == l5 && !l5.is_neutral() {
            l5
        } else {
            Bias::Neutral
        }
    } else if l5 == bias {
        bias
    } else {
        Bias::Neutral
    }
}

/// Combine normalized single-timeframe legs (1m, 5m, 30m) into one call.
pub fn fuse(config: &EngineConfig, legs: &[Prediction; 3]) -> Prediction {
    let [m1, m5, m30] = legs;

    let p_bull = blend([m1.p_bull, m5.p_bull, m30.p_bull]).clamp(0.0, 1.0);
    let confidence = blend([m1.confidence, m5.confidence, m30.confidence]).clamp(0.0, 100.0);
    let label = fused_label(m1.label, m5.label, m30.label);

    let mut timeframe_flags = TimeframeFlags::default();
    for (tf, leg) in Timeframe::ALL.iter().zip(legs.iter()) {
        timeframe_flags.set(*tf, leg.label == Bias::Bullish);
    }

    let anchor_levels: Vec<Level> = m30
        .support_levels
        .iter()
        .chain(m30.resistance_levels.iter())
        .copied()
        .collect();
    let plan = if label.is_neutral() {
        TradePlan::default()
    } else {
        TradePlanner::default().plan(m30.reference_price, &anchor_levels, label)
    };

    let buy_type = match label {
        Bias::Bullish if legs.iter().any(|l| l.buy_type == BuyType::Type2Breakout) => {
            BuyType::Type2Breakout
        }
        Bias::Bullish => BuyType::Standard,
        _ => BuyType::None,
    };

    let signal = fused_signal(
        config,
        legs,
        label,
        timeframe_flags.confluence(),
        plan.risk_reward,
        confidence,
        buy_type,
    );

    let patterns = legs
        .iter()
        .flat_map(|l| l.breakdown.patterns.iter().copied())
        .collect();

    tracing::debug!(
        p_bull,
        label = %label,
        signal = %signal,
        bullish_legs = timeframe_flags.confluence(),
        "Fused timeframes"
    );

    Prediction {
        p_bull,
        p_bear: 1.0 - p_bull,
        label,
        confidence,
        signal,
        plan,
        buy_type,
        timeframe: None,
        timeframe_flags,
        confluence: timeframe_flags.confluence(),
        support_levels: m30.support_levels.clone(),
        resistance_levels: m30.resistance_levels.clone(),
        active_support: m30.active_support,
        active_resistance: m30.active_resistance,
        support_distance: m30.support_distance,
        resistance_distance: m30.resistance_distance,
        reference_price: m30.reference_price,
        breakdown: FeatureBreakdown {
            patterns,
            ..m30.breakdown.clone()
        },
        swings: m30.swings.clone(),
    }
}

fn fused_signal(
    config: &EngineConfig,
    legs: &[Prediction; 3],
    label: Bias,
    confluence: u8,
    risk_reward: f64,
    confidence: f64,
    buy_type: BuyType,
) -> SignalTier {
    let [m1, m5, m30] = legs;
    if label.is_neutral() {
        return SignalTier::Neutral;
    }

    if confluence < MIN_CONFLUENCE {
        return SignalTier::Neutral;
    }
    let locked = if m30.label.is_neutral() {
        m1.label == m5.label
    } else {
        m5.label == m30.label
    };
    if !locked {
        return SignalTier::Neutral;
    }

    let exempt =
        buy_type == BuyType::Type2Breakout && config.breakout_exemption.multi_timeframe();
    calibrator::tier_signal(
        label,
        risk_reward,
        confidence,
        config.confidence_threshold,
        exempt,
    )
}
