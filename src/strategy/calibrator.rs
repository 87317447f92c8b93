//! Probability Calibrator
//!
//! Turns an adjusted score into a probability and label, then grades the
//! call into a signal tier using the plan's risk/reward and the confidence.

use serde::{Deserialize, Serialize};

use crate::types::{Bias, SignalTier};

/// Score divisor before the logistic
const SIGMOID_SCALE: f64 = 2.5;
/// Logistic input bound
const SIGMOID_CLAMP: f64 = 50.0;

/// Scores inside ±NEUTRAL_ZONE are called Neutral
pub const NEUTRAL_ZONE: f64 = 2.0;
const NEUTRAL_TILT: f64 = 0.05;

const BREAKOUT_BASE: f64 = 0.65;
const BREAKOUT_SPAN: f64 = 0.25;

const NEAR_BARRIER: f64 = 0.015;
const NEAR_BARRIER_MULT: f64 = 0.65;
const CLOSE_BARRIER: f64 = 0.030;
const CLOSE_BARRIER_MULT: f64 = 0.80;

/// Minimum risk/reward for any directional signal
pub const MIN_RISK_REWARD: f64 = 1.2;
/// Risk/reward that unlocks the strong tier
pub const STRONG_RISK_REWARD: f64 = 1.8;
/// Confidence for a strong signal
pub const STRONG_CONFIDENCE: f64 = 80.0;
/// Confidence for a plain signal when RR is high
pub const PLAIN_CONFIDENCE: f64 = 65.0;

/// Probability, label and confidence of one call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub p_bull: f64,
    pub p_bear: f64,
    pub label: Bias,
    /// 0-100
    pub confidence: f64,
}

impl Calibration {
    fn from_p_bull(p_bull: f64, label: Bias, confidence: f64) -> Self {
        Self {
            p_bull,
            p_bear: 1.0 - p_bull,
            label,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }
}

/// Where the confidence-threshold exemption for breakout buys applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutExemption {
    /// Single-timeframe predictions only
    #[default]
    SingleTimeframe,
    /// Single-timeframe and fused multi-timeframe predictions
    AllLayers,
    /// Never; breakout buys face the threshold like any other call
    Disabled,
}

impl BreakoutExemption {
    pub fn single_timeframe(&self) -> bool {
        !matches!(self, BreakoutExemption::Disabled)
    }

    pub fn multi_timeframe(&self) -> bool {
        matches!(self, BreakoutExemption::AllLayers)
    }
}

pub fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-SIGMOID_CLAMP, SIGMOID_CLAMP);
    1.0 / (1.0 + (-x).exp())
}

/// Logistic calibration with the neutral zone applied.
pub fn calibrate(adjusted_score: f64) -> Calibration {
    if adjusted_score.abs() < NEUTRAL_ZONE {
        let ratio = adjusted_score / NEUTRAL_ZONE;
        let tilt = NEUTRAL_TILT * ratio.clamp(-1.0, 1.0);
        return Calibration::from_p_bull(0.5 + tilt, Bias::Neutral, 50.0 + 10.0 * ratio.abs());
    }

    let p_bull = sigmoid(adjusted_score / SIGMOID_SCALE);
    let label = if p_bull >= 0.5 {
        Bias::Bullish
    } else {
        Bias::Bearish
    };
    Calibration::from_p_bull(p_bull, label, 100.0 * p_bull.max(1.0 - p_bull))
}

/// Neutral call promoted to a bullish breakout buy
pub fn promote_breakout(breakout_score: f64) -> Calibration {
    let s = breakout_score.clamp(0.0, 1.0);
    let p_bull = (BREAKOUT_BASE + BREAKOUT_SPAN * s).clamp(0.0, 1.0);
    Calibration::from_p_bull(p_bull, Bias::Bullish, 100.0 * p_bull)
}

/// Damp confidence when price sits right under the opposing barrier.
pub fn barrier_penalty(confidence: f64, opposing_distance: Option<f64>) -> f64 {
    let mult = match opposing_distance {
        Some(d) if d < NEAR_BARRIER => NEAR_BARRIER_MULT,
        Some(d) if d < CLOSE_BARRIER => CLOSE_BARRIER_MULT,
        _ => 1.0,
    };
    (confidence * mult).clamp(0.0, 100.0)
}

/// Grade a directional call by risk/reward and confidence.
///
/// `exempt` lets a bullish breakout bypass `threshold` once its RR passes.
pub fn tier_signal(
    label: Bias,
    risk_reward: f64,
    confidence: f64,
    threshold: f64,
    exempt: bool,
) -> SignalTier {
    if label.is_neutral() || risk_reward < MIN_RISK_REWARD {
        return SignalTier::Neutral;
    }

    let strong = confidence >= STRONG_CONFIDENCE;
    let tier = if risk_reward < STRONG_RISK_REWARD {
        SignalTier::directional(label, false)
    } else if strong {
        SignalTier::directional(label, true)
    } else if confidence >= PLAIN_CONFIDENCE {
        SignalTier::directional(label, false)
    } else {
        SignalTier::Neutral
    };

    if confidence >= threshold {
        tier
    } else if exempt && label == Bias::Bullish {
        SignalTier::directional(Bias::Bullish, strong)
    } else {
        SignalTier::Neutral
    }
}
