//! Trade Planner - Stops, targets and risk/reward
//!
//! Implements:
//! - Stop-loss just beyond the nearest protective level
//! - Two targets: the opposing level and an extension past it
//! - Risk/reward from the clamped plan
//! - Optional mapping from normalized chart space to real prices

use serde::{Deserialize, Serialize};

use crate::features::levels::{nearest_resistance, nearest_support};
use crate::types::{Bias, Level, Prediction, TradePlan};

/// Planner configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskConfig {
    /// Synthetic level distance when no real level exists on a side
    pub fallback_offset: f64,
    /// Stop distance beyond the protective level
    pub stop_offset: f64,
    /// Second target extension as a fraction of the first target's distance
    pub extension: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            fallback_offset: 0.03,
            stop_offset: 0.01,
            extension: 0.8,
        }
    }
}

/// Builds trade plans in normalized [0, 1] chart space
#[derive(Debug, Clone, Default)]
pub struct TradePlanner {
    config: RiskConfig,
}

impl TradePlanner {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Support and resistance bracketing `last`, with synthetic fallbacks.
    pub fn bracket(&self, last: f64, levels: &[Level]) -> (f64, f64) {
        let support = nearest_support(levels, last)
            .map(|l| l.price)
            .unwrap_or(last - self.config.fallback_offset);
        let resistance = nearest_resistance(levels, last)
            .map(|l| l.price)
            .unwrap_or(last + self.config.fallback_offset);
        (support.clamp(0.0, 1.0), resistance.clamp(0.0, 1.0))
    }

    /// Plan for a directional call. Neutral gets the zero plan.
    pub fn plan(&self, last: f64, levels: &[Level], bias: Bias) -> TradePlan {
        let (support, resistance) = self.bracket(last, levels);
        let unit = |x: f64| x.clamp(0.0, 1.0);

        let (stop_loss, target1, target2) = match bias {
            Bias::Neutral => return TradePlan::default(),
            Bias::Bullish => (
                unit(support - self.config.stop_offset),
                unit(resistance),
                unit(resistance + self.config.extension * (resistance - last)),
            ),
            Bias::Bearish => (
                unit(resistance + self.config.stop_offset),
                unit(support),
                unit(support - self.config.extension * (last - support)),
            ),
        };

        let (risk, reward) = match bias {
            Bias::Bearish => (stop_loss - last, last - target1),
            _ => (last - stop_loss, target1 - last),
        };
        let risk_reward = if risk > 0.0 { reward / risk } else { 0.0 };

        TradePlan {
            stop_loss,
            target1,
            target2,
            risk_reward,
        }
    }
}

/// Real price range spanned by the chart's plot area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceScale {
    pub min: f64,
    pub max: f64,
}

impl PriceScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min + n·(max − min)`
    pub fn map(&self, normalized: f64) -> f64 {
        self.min + normalized * (self.max - self.min)
    }

    /// Map stops and targets; the ratio is scale-free and stays as is.
    pub fn map_plan(&self, plan: &TradePlan) -> TradePlan {
        TradePlan {
            stop_loss: self.map(plan.stop_loss),
            target1: self.map(plan.target1),
            target2: self.map(plan.target2),
            risk_reward: plan.risk_reward,
        }
    }

    pub fn map_level(&self, level: &Level) -> Level {
        Level {
            price: self.map(level.price),
            ..*level
        }
    }

    /// Map every price-like field of a finished prediction. Distances and
    /// swing points stay normalized.
    pub fn apply(&self, prediction: &mut Prediction) {
        if !prediction.plan.is_empty() {
            prediction.plan = self.map_plan(&prediction.plan);
        }
        for level in prediction
            .support_levels
            .iter_mut()
            .chain(prediction.resistance_levels.iter_mut())
        {
            *level = self.map_level(level);
        }
        prediction.active_support = prediction.active_support.map(|p| self.map(p));
        prediction.active_resistance = prediction.active_resistance.map(|p| self.map(p));
        prediction.reference_price = self.map(prediction.reference_price);
        if prediction.breakdown.breakout.fired {
            prediction.breakdown.breakout.level = self.map(prediction.breakdown.breakout.level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64, is_support: bool) -> Level {
        Level {
            price,
            touches: 1,
            strength: 0.1,
            is_support,
        }
    }

    #[test]
    fn test_bullish_plan_uses_levels() {
        let planner = TradePlanner::default();
        let levels = [level(0.40, true), level(0.70, false)];
        let plan = planner.plan(0.50, &levels, Bias::Bullish);

        assert!((plan.stop_loss - 0.39).abs() < 1e-12);
        assert!((plan.target1 - 0.70).abs() < 1e-12);
        assert!((plan.target2 - 0.86).abs() < 1e-12);
        // reward 0.20 / risk 0.11
        assert!((plan.risk_reward - 0.20 / 0.11).abs() < 1e-9);
    }

    #[test]
    fn test_bearish_plan_mirrors() {
        let planner = TradePlanner::default();
        let levels = [level(0.30, true), level(0.55, false)];
        let plan = planner.plan(0.50, &levels, Bias::Bearish);

        assert!((plan.stop_loss - 0.56).abs() < 1e-12);
        assert!((plan.target1 - 0.30).abs() < 1e-12);
        assert!((plan.target2 - 0.14).abs() < 1e-12);
        assert!((plan.risk_reward - 0.20 / 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_levels_give_poor_ratio() {
        let planner = TradePlanner::default();
        let plan = planner.plan(0.50, &[], Bias::Bullish);
        // 0.03 reward against 0.04 risk
        assert!((plan.risk_reward - 0.75).abs() < 1e-9);
        assert!(plan.risk_reward < 1.0);
    }

    #[test]
    fn test_neutral_is_zero_plan() {
        let planner = TradePlanner::default();
        assert_eq!(planner.plan(0.5, &[], Bias::Neutral), TradePlan::default());
    }

    #[test]
    fn test_values_clamped_to_unit_range() {
        let planner = TradePlanner::default();
        let plan = planner.plan(0.99, &[], Bias::Bullish);
        assert!(plan.target1 <= 1.0 && plan.target2 <= 1.0);
        let plan = planner.plan(0.005, &[], Bias::Bearish);
        assert!(plan.target1 >= 0.0 && plan.target2 >= 0.0);
    }

    #[test]
    fn test_price_scale() {
        let scale = PriceScale::new(400.0, 500.0);
        assert_eq!(scale.map(0.0), 400.0);
        assert_eq!(scale.map(1.0), 500.0);
        assert_eq!(scale.map(0.25), 425.0);

        let plan = TradePlan {
            stop_loss: 0.5,
            target1: 0.75,
            target2: 1.0,
            risk_reward: 2.0,
        };
        let mapped = scale.map_plan(&plan);
        assert_eq!(mapped.stop_loss, 450.0);
        assert_eq!(mapped.risk_reward, 2.0);
    }

    #[test]
    fn test_scale_prediction_keeps_distances_and_zero_plan() {
        let scale = PriceScale::new(100.0, 200.0);
        let mut pred = Prediction {
            support_levels: vec![level(0.25, true)],
            active_support: Some(0.25),
            support_distance: Some(0.25),
            reference_price: 0.5,
            ..Default::default()
        };
        scale.apply(&mut pred);

        assert_eq!(pred.support_levels[0].price, 125.0);
        assert_eq!(pred.active_support, Some(125.0));
        assert_eq!(pred.support_distance, Some(0.25));
        assert_eq!(pred.reference_price, 150.0);
        assert_eq!(pred.active_resistance, None);
        // no plan stays all-zero rather than mapping to the range floor
        assert_eq!(pred.plan, TradePlan::default());
    }
}
