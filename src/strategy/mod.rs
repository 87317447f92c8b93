//! Signal Engine
//!
//! One pipeline from pixels to a graded call:
//! - extract the close series from the chart
//! - smooth, find swings, cluster levels
//! - score trend, momentum, reversal and support/resistance
//! - scale the score by session time and calibrate it to a probability
//! - promote neutral breakouts, build the plan, grade by risk/reward
//!
//! Configuration is passed into every call, so one engine can serve many
//! charts and timeframes without any state changing between calls.

pub mod breakout;
pub mod calibrator;
pub mod multi_timeframe;
pub mod scorer;

pub use breakout::detect_breakout;
pub use calibrator::{BreakoutExemption, Calibration};
pub use multi_timeframe::MultiTimeframeResult;
pub use scorer::{SubScores, Weights};

use std::path::Path;

use crate::error::{ChartError, Result};
use crate::extraction::{extract_close, load_grid, ColorConfig};
use crate::features::{nearest_resistance, nearest_support, partition, FeatureEngine, SessionTime};
use crate::risk::{PriceScale, TradePlanner};
use crate::types::{
    Bias, BuyType, FeatureBreakdown, PatternTag, PixelGrid, Prediction, Rgb, SignalTier,
    Timeframe, TimeframeFlags, TradePlan,
};

/// Engine configuration, read on every call
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub colors: ColorConfig,
    pub weights: Weights,
    /// Calls below this confidence (0-100) are graded NEUTRAL
    pub confidence_threshold: f64,
    pub breakout_exemption: BreakoutExemption,
    pub smoothing_window: usize,
    pub swing_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            colors: ColorConfig::default(),
            weights: Weights::default(),
            confidence_threshold: 60.0,
            breakout_exemption: BreakoutExemption::default(),
            smoothing_window: 3,
            swing_window: 8,
        }
    }
}

/// Per-call inputs besides the chart itself
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PredictionContext {
    pub session: SessionTime,
    /// Adapts the weights when set
    pub timeframe: Option<Timeframe>,
    /// Maps the output to real prices when set
    pub scale: Option<PriceScale>,
}

impl PredictionContext {
    /// Context at a `HH:MM` market time; malformed times are neutral.
    pub fn at(time: &str) -> Self {
        Self {
            session: SessionTime::parse(time),
            ..Default::default()
        }
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn with_scale(mut self, scale: Option<PriceScale>) -> Self {
        self.scale = scale;
        self
    }
}

/// Extract, analyze and grade one chart.
pub fn run_pipeline<G: PixelGrid + ?Sized>(
    config: &EngineConfig,
    grid: &G,
    ctx: &PredictionContext,
) -> Prediction {
    let closes = extract_close(grid, &config.colors);
    let mut prediction = analyze_closes(config, &closes, ctx);
    if let Some(scale) = &ctx.scale {
        scale.apply(&mut prediction);
    }
    prediction
}

/// Everything after extraction, in normalized space. The context's price
/// scale is not applied here.
pub fn analyze_closes(
    config: &EngineConfig,
    closes: &[f64],
    ctx: &PredictionContext,
) -> Prediction {
    let features =
        FeatureEngine::new(config.smoothing_window, config.swing_window).compute(closes);
    let last = features.last_price();

    let weights = match ctx.timeframe {
        Some(tf) => config.weights.for_timeframe(tf),
        None => config.weights,
    };
    let subs = scorer::score(&features.smoothed, &features.swings, &features.levels);
    let raw_score = subs.combine(&weights);
    let adjusted_score = raw_score * ctx.session.score_multiplier();

    let breakout = detect_breakout(closes, &features.levels, subs.trend);
    let mut patterns = subs.patterns.clone();
    if breakout.fired {
        patterns.push(PatternTag::Type2Breakout);
    }

    let active_support = nearest_support(&features.levels, last).map(|l| l.price);
    let active_resistance = nearest_resistance(&features.levels, last).map(|l| l.price);
    let support_distance = active_support.map(|s| last - s);
    let resistance_distance = active_resistance.map(|r| r - last);

    let mut calibration = calibrator::calibrate(adjusted_score);
    let mut buy_type = BuyType::None;
    if calibration.label.is_neutral() && breakout.fired {
        calibration = calibrator::promote_breakout(breakout.score);
        buy_type = BuyType::Type2Breakout;
    } else if calibration.label == Bias::Bullish {
        buy_type = BuyType::Standard;
    }

    let (plan, signal) = if calibration.label.is_neutral() {
        (TradePlan::default(), SignalTier::Neutral)
    } else {
        let plan = TradePlanner::default().plan(last, &features.levels, calibration.label);
        let opposing = match calibration.label {
            Bias::Bullish => resistance_distance,
            _ => support_distance,
        };
        calibration.confidence = calibrator::barrier_penalty(calibration.confidence, opposing);

        let exempt = buy_type == BuyType::Type2Breakout
            && config.breakout_exemption.single_timeframe();
        let signal = calibrator::tier_signal(
            calibration.label,
            plan.risk_reward,
            calibration.confidence,
            config.confidence_threshold,
            exempt,
        );
        (plan, signal)
    };

    let mut timeframe_flags = TimeframeFlags::default();
    if let Some(tf) = ctx.timeframe {
        timeframe_flags.set(tf, calibration.label == Bias::Bullish);
    }

    tracing::debug!(
        raw_score,
        adjusted_score,
        label = %calibration.label,
        confidence = calibration.confidence,
        signal = %signal,
        rr = plan.risk_reward,
        "Chart analyzed"
    );

    let (support_levels, resistance_levels) = partition(&features.levels);
    Prediction {
        p_bull: calibration.p_bull,
        p_bear: calibration.p_bear,
        label: calibration.label,
        confidence: calibration.confidence,
        signal,
        plan,
        buy_type,
        timeframe: ctx.timeframe,
        timeframe_flags,
        confluence: timeframe_flags.confluence(),
        support_levels,
        resistance_levels,
        active_support,
        active_resistance,
        support_distance,
        resistance_distance,
        reference_price: last,
        breakdown: FeatureBreakdown {
            trend_score: subs.trend,
            momentum_score: subs.momentum,
            reversal_score: subs.reversal,
            sr_score: subs.sr,
            raw_score,
            adjusted_score,
            patterns,
            breakout,
        },
        swings: features.swings,
    }
}

/// Chart signal engine
///
/// Holds a configuration and offers the convenience entry points around
/// [`run_pipeline`]. Every prediction method takes `&self`.
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    config: EngineConfig,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_candle_colors(&mut self, bull: Rgb, bear: Rgb, tolerance: u8) {
        self.config.colors = ColorConfig {
            bull,
            bear,
            tolerance,
        };
    }

    pub fn set_weights(&mut self, weights: Weights) {
        self.config.weights = weights;
    }

    pub fn set_confidence_threshold(&mut self, threshold: f64) {
        self.config.confidence_threshold = threshold.clamp(0.0, 100.0);
    }

    /// Single chart with base weights.
    pub fn predict<G: PixelGrid + ?Sized>(
        &self,
        grid: &G,
        time: &str,
        scale: Option<PriceScale>,
    ) -> Prediction {
        run_pipeline(&self.config, grid, &PredictionContext::at(time).with_scale(scale))
    }

    /// Single chart with weights adapted to `timeframe`.
    pub fn predict_for_timeframe<G: PixelGrid + ?Sized>(
        &self,
        grid: &G,
        timeframe: Timeframe,
        time: &str,
        scale: Option<PriceScale>,
    ) -> Prediction {
        let ctx = PredictionContext::at(time)
            .with_timeframe(timeframe)
            .with_scale(scale);
        run_pipeline(&self.config, grid, &ctx)
    }

    /// Infer the timeframe from `image_name`, falling back to `fallback`.
    pub fn predict_auto<G: PixelGrid + ?Sized>(
        &self,
        image_name: &str,
        grid: &G,
        fallback: Option<Timeframe>,
        time: &str,
        scale: Option<PriceScale>,
    ) -> Result<Prediction> {
        let timeframe = resolve_timeframe(image_name, fallback)?;
        Ok(self.predict_for_timeframe(grid, timeframe, time, scale))
    }

    /// Decode an image file and predict with an explicit or inferred timeframe.
    pub fn predict_file(
        &self,
        path: impl AsRef<Path>,
        timeframe: Option<Timeframe>,
        time: &str,
        scale: Option<PriceScale>,
    ) -> Result<Prediction> {
        let path = path.as_ref();
        let name = path.to_string_lossy();
        let timeframe = resolve_timeframe(&name, timeframe)?;
        let grid = load_grid(path)?;
        Ok(self.predict_for_timeframe(&grid, timeframe, time, scale))
    }

    /// Run the 1m, 5m and 30m charts and fuse them.
    pub fn predict_multi_timeframe<G: PixelGrid + ?Sized>(
        &self,
        m1: &G,
        m5: &G,
        m30: &G,
        time: &str,
        scale: Option<PriceScale>,
    ) -> MultiTimeframeResult {
        let ctx = PredictionContext::at(time).with_scale(scale);
        multi_timeframe::run_multi_timeframe(&self.config, [m1, m5, m30], &ctx)
    }
}

/// Explicit timeframe wins; otherwise infer from the file name.
pub fn resolve_timeframe(image_name: &str, explicit: Option<Timeframe>) -> Result<Timeframe> {
    explicit
        .or_else(|| Timeframe::from_filename(image_name))
        .ok_or_else(|| ChartError::UnknownTimeframe(image_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RgbGrid;

    /// Oscillating closes that end pressed against the top of their range
    fn rising_closes() -> Vec<f64> {
        (0..200)
            .map(|i| {
                let t = i as f64;
                (0.2 + t * 0.003 + 0.05 * (t * std::f64::consts::PI / 20.0).sin()).clamp(0.0, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_flat_closes_are_neutral() {
        let pred = analyze_closes(
            &EngineConfig::default(),
            &vec![0.5; 190],
            &PredictionContext::default(),
        );
        assert_eq!(pred.label, Bias::Neutral);
        assert_eq!(pred.signal, SignalTier::Neutral);
        assert_eq!(pred.plan, TradePlan::default());
        assert_eq!(pred.breakdown.raw_score, 0.0);
        assert_eq!(pred.confidence, 50.0);
        assert_eq!(pred.buy_type, BuyType::None);
    }

    #[test]
    fn test_probabilities_and_bounds() {
        let pred = analyze_closes(
            &EngineConfig::default(),
            &rising_closes(),
            &PredictionContext::at("11:00"),
        );
        assert!((pred.p_bull + pred.p_bear - 1.0).abs() < 1e-12);
        assert!((0.0..=100.0).contains(&pred.confidence));
        if pred.plan.risk_reward < 1.0 {
            assert_eq!(pred.signal, SignalTier::Neutral);
        }
        assert!(pred.breakdown.raw_score.abs() <= scorer::RAW_SCORE_LIMIT);
    }

    #[test]
    fn test_session_scales_score() {
        let config = EngineConfig::default();
        let closes = rising_closes();
        let regular = analyze_closes(&config, &closes, &PredictionContext::at("11:00"));
        let at_open = analyze_closes(&config, &closes, &PredictionContext::at("09:30"));
        assert_eq!(regular.breakdown.raw_score, at_open.breakdown.raw_score);
        assert!(
            (at_open.breakdown.adjusted_score - 0.7 * regular.breakdown.raw_score).abs() < 1e-12
        );
    }

    #[test]
    fn test_timeframe_changes_weights_only_for_call() {
        let config = EngineConfig::default();
        let closes = rising_closes();
        let ctx = PredictionContext::at("11:00").with_timeframe(Timeframe::Min30);
        let pred = analyze_closes(&config, &closes, &ctx);
        assert_eq!(pred.timeframe, Some(Timeframe::Min30));
        assert_eq!(config.weights, Weights::default());
        assert_eq!(
            pred.timeframe_flags.thirty_minute,
            pred.label == Bias::Bullish
        );
    }

    #[test]
    fn test_setters() {
        let mut engine = SignalEngine::default();
        engine.set_candle_colors(Rgb::new(0, 255, 0), Rgb::new(255, 0, 0), 10);
        engine.set_confidence_threshold(150.0);
        engine.set_weights(Weights {
            momentum: 1.0,
            ..Weights::default()
        });
        assert_eq!(engine.config().colors.bull, Rgb::new(0, 255, 0));
        assert_eq!(engine.config().colors.tolerance, 10);
        assert_eq!(engine.config().confidence_threshold, 100.0);
        assert_eq!(engine.config().weights.momentum, 1.0);
    }

    #[test]
    fn test_auto_timeframe_requires_a_hint() {
        let engine = SignalEngine::default();
        let grid = RgbGrid::filled(50, 40, Rgb::new(0, 0, 0));

        let pred = engine
            .predict_auto("charts/spy_5m.png", &grid, None, "10:00", None)
            .unwrap();
        assert_eq!(pred.timeframe, Some(Timeframe::Min5));

        let pred = engine
            .predict_auto("chart.png", &grid, Some(Timeframe::Min1), "10:00", None)
            .unwrap();
        assert_eq!(pred.timeframe, Some(Timeframe::Min1));

        let err = engine
            .predict_auto("chart.png", &grid, None, "10:00", None)
            .unwrap_err();
        assert!(matches!(err, ChartError::UnknownTimeframe(_)));
    }

    #[test]
    fn test_predict_file_missing_is_decode_error() {
        let engine = SignalEngine::default();
        let err = engine
            .predict_file("no/such/test1.png", None, "10:00", None)
            .unwrap_err();
        assert!(matches!(err, ChartError::ImageDecode { .. }));
    }
}
