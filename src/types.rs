//! Core types used throughout chartsight
//!
//! Defines pixels, series points, levels, pattern tags, signals and the
//! final prediction record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single RGB pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Read-only access to a decoded chart image.
///
/// Decoding is the caller's business; the pipeline only needs a rectangle
/// of RGB triples addressed as `(column, row)` with row 0 at the top.
pub trait PixelGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Pixel at column `x`, row `y`. Callers stay inside `width × height`.
    fn pixel(&self, x: usize, y: usize) -> Rgb;
}

/// Owned row-major pixel grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbGrid {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl RgbGrid {
    /// Grid filled with a single color
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }
}

impl PixelGrid for RgbGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }
}

/// Ordered scalars in [0, 1], one per sampled chart column
pub type NormalizedSeries = Vec<f64>;

/// Supported chart timeframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Min1,
    Min5,
    Min30,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Min1, Timeframe::Min5, Timeframe::Min30];

    /// Bar length in minutes
    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::Min1 => 1,
            Timeframe::Min5 => 5,
            Timeframe::Min30 => 30,
        }
    }

    /// Parse from string ("1", "1m", "5min", "30m", ...)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1m" | "1min" => Some(Timeframe::Min1),
            "5" | "5m" | "5min" => Some(Timeframe::Min5),
            "30" | "30m" | "30min" => Some(Timeframe::Min30),
            _ => None,
        }
    }

    /// Infer the timeframe from a chart file name (`test30.png`, `spy_5m.png`, ...)
    pub fn from_filename(name: &str) -> Option<Self> {
        if name.contains("test30") || name.contains("_30m") {
            Some(Timeframe::Min30)
        } else if name.contains("test5") || name.contains("_5m") {
            Some(Timeframe::Min5)
        } else if name.contains("test1") || name.contains("_1m") {
            Some(Timeframe::Min1)
        } else {
            None
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// Local extremum in the smoothed series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// Column index in the series
    pub index: usize,
    /// Normalized value at that index
    pub value: f64,
    /// True for a swing high, false for a swing low
    pub is_high: bool,
}

/// Clustered support or resistance band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub touches: u32,
    /// min(touches, 10) / 10
    pub strength: f64,
    pub is_support: bool,
}

/// Explainability tags emitted by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternTag {
    HhHl,
    LhLl,
    HhLlMixed,
    LhHlMixed,
    DoubleTop,
    DoubleBottom,
    SupResUsed,
    Type2Breakout,
}

impl PatternTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::HhHl => "HH_HL",
            PatternTag::LhLl => "LH_LL",
            PatternTag::HhLlMixed => "HH_LL_MIXED",
            PatternTag::LhHlMixed => "LH_HL_MIXED",
            PatternTag::DoubleTop => "DOUBLE_TOP",
            PatternTag::DoubleBottom => "DOUBLE_BOTTOM",
            PatternTag::SupResUsed => "SUP_RES_USED",
            PatternTag::Type2Breakout => "TYPE2_BREAKOUT",
        }
    }
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directional call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for Bias {
    fn default() -> Self {
        Bias::Neutral
    }
}

impl Bias {
    pub fn is_neutral(&self) -> bool {
        matches!(self, Bias::Neutral)
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Bullish => write!(f, "Bullish"),
            Bias::Bearish => write!(f, "Bearish"),
            Bias::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Five-tier trade signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalTier {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Default for SignalTier {
    fn default() -> Self {
        SignalTier::Neutral
    }
}

impl SignalTier {
    /// Plain tier in the direction of `bias` (Neutral for a neutral bias)
    pub fn directional(bias: Bias, strong: bool) -> Self {
        match (bias, strong) {
            (Bias::Bullish, true) => SignalTier::StrongBuy,
            (Bias::Bullish, false) => SignalTier::Buy,
            (Bias::Bearish, true) => SignalTier::StrongSell,
            (Bias::Bearish, false) => SignalTier::Sell,
            (Bias::Neutral, _) => SignalTier::Neutral,
        }
    }
}

impl fmt::Display for SignalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalTier::StrongBuy => write!(f, "STRONG_BUY"),
            SignalTier::Buy => write!(f, "BUY"),
            SignalTier::Neutral => write!(f, "NEUTRAL"),
            SignalTier::Sell => write!(f, "SELL"),
            SignalTier::StrongSell => write!(f, "STRONG_SELL"),
        }
    }
}

/// Source of a bullish call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyType {
    None,
    /// Score-driven bullish call
    Standard,
    /// Neutral score promoted by the breakout detector
    Type2Breakout,
}

impl Default for BuyType {
    fn default() -> Self {
        BuyType::None
    }
}

impl fmt::Display for BuyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuyType::None => write!(f, "NONE"),
            BuyType::Standard => write!(f, "STANDARD"),
            BuyType::Type2Breakout => write!(f, "TYPE2_BREAKOUT"),
        }
    }
}

/// Breakout detector output
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakoutSignal {
    pub fired: bool,
    /// Quality in [0, 1]
    pub score: f64,
    /// Resistance that was cleared
    pub level: f64,
}

/// Per-prediction scoring record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureBreakdown {
    pub trend_score: f64,
    pub momentum_score: f64,
    pub reversal_score: f64,
    pub sr_score: f64,
    /// Weighted sum, clamped to [-8, 8]
    pub raw_score: f64,
    /// Raw score after the two time-of-day multipliers
    pub adjusted_score: f64,
    pub patterns: Vec<PatternTag>,
    pub breakout: BreakoutSignal,
}

/// Stop/target levels; all zero when no plan applies
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradePlan {
    pub stop_loss: f64,
    pub target1: f64,
    pub target2: f64,
    pub risk_reward: f64,
}

impl TradePlan {
    /// True for the all-zero "no plan" value
    pub fn is_empty(&self) -> bool {
        *self == TradePlan::default()
    }
}

/// Bullish flag per analyzed timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeframeFlags {
    pub one_minute: bool,
    pub five_minute: bool,
    pub thirty_minute: bool,
}

impl TimeframeFlags {
    pub fn set(&mut self, timeframe: Timeframe, bullish: bool) {
        match timeframe {
            Timeframe::Min1 => self.one_minute = bullish,
            Timeframe::Min5 => self.five_minute = bullish,
            Timeframe::Min30 => self.thirty_minute = bullish,
        }
    }

    /// Number of bullish timeframes (0-3)
    pub fn confluence(&self) -> u8 {
        [self.one_minute, self.five_minute, self.thirty_minute]
            .iter()
            .filter(|&&b| b)
            .count() as u8
    }
}

/// Final output of one pipeline run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Prediction {
    pub p_bull: f64,
    pub p_bear: f64,
    pub label: Bias,
    /// 0-100
    pub confidence: f64,
    pub signal: SignalTier,
    pub plan: TradePlan,
    pub buy_type: BuyType,
    /// Timeframe the weights were adapted to, if any
    pub timeframe: Option<Timeframe>,
    pub timeframe_flags: TimeframeFlags,
    /// Count of bullish timeframes (0-3)
    pub confluence: u8,
    /// Ascending, at most 6
    pub support_levels: Vec<Level>,
    /// Ascending, at most 6
    pub resistance_levels: Vec<Level>,
    pub active_support: Option<f64>,
    pub active_resistance: Option<f64>,
    /// Always normalized, even when a price scale is applied
    pub support_distance: Option<f64>,
    /// Always normalized, even when a price scale is applied
    pub resistance_distance: Option<f64>,
    /// Last smoothed close the plan was built around
    pub reference_price: f64,
    pub breakdown: FeatureBreakdown,
    /// Cleaned swing points, for chart overlays
    pub swings: Vec<SwingPoint>,
}

impl Prediction {
    pub fn is_actionable(&self) -> bool {
        self.signal != SignalTier::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_from_filename() {
        assert_eq!(
            Timeframe::from_filename("assets/charts/test30.png"),
            Some(Timeframe::Min30)
        );
        assert_eq!(Timeframe::from_filename("test5.png"), Some(Timeframe::Min5));
        assert_eq!(Timeframe::from_filename("test1.png"), Some(Timeframe::Min1));
        assert_eq!(Timeframe::from_filename("spy_30m.png"), Some(Timeframe::Min30));
        assert_eq!(Timeframe::from_filename("spy_5m.png"), Some(Timeframe::Min5));
        assert_eq!(Timeframe::from_filename("spy_1m.png"), Some(Timeframe::Min1));
        assert_eq!(Timeframe::from_filename("chart.png"), None);
    }

    #[test]
    fn test_timeframe_from_str() {
        assert_eq!(Timeframe::from_str("30m"), Some(Timeframe::Min30));
        assert_eq!(Timeframe::from_str("5"), Some(Timeframe::Min5));
        assert_eq!(Timeframe::from_str("1MIN"), Some(Timeframe::Min1));
        assert_eq!(Timeframe::from_str("1h"), None);
    }

    #[test]
    fn test_pattern_tag_display() {
        assert_eq!(PatternTag::HhLlMixed.to_string(), "HH_LL_MIXED");
        assert_eq!(PatternTag::Type2Breakout.to_string(), "TYPE2_BREAKOUT");
    }

    #[test]
    fn test_signal_tier_directional() {
        assert_eq!(SignalTier::directional(Bias::Bullish, true), SignalTier::StrongBuy);
        assert_eq!(SignalTier::directional(Bias::Bearish, false), SignalTier::Sell);
        assert_eq!(SignalTier::directional(Bias::Neutral, true), SignalTier::Neutral);
        assert_eq!(SignalTier::StrongSell.to_string(), "STRONG_SELL");
    }

    #[test]
    fn test_confluence_counts_bullish_flags() {
        let mut flags = TimeframeFlags::default();
        flags.set(Timeframe::Min1, true);
        flags.set(Timeframe::Min30, true);
        assert_eq!(flags.confluence(), 2);
    }

    #[test]
    fn test_grid_from_fn() {
        let grid = RgbGrid::from_fn(3, 2, |x, y| Rgb::new(x as u8, y as u8, 0));
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.pixel(2, 1), Rgb::new(2, 1, 0));
    }
}
