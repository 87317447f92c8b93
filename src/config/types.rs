//! Configuration section types

use serde::Deserialize;

use crate::strategy::BreakoutExemption;
use crate::types::Rgb;

#[derive(Debug, Clone, Deserialize)]
pub struct ColorsConfig {
    /// Bullish candle body color
    pub bull: Rgb,
    /// Bearish candle body color
    pub bear: Rgb,
    /// Per-channel match tolerance
    pub tolerance: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    pub trend: f64,
    pub momentum: f64,
    pub reversal: f64,
    pub sr: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Minimum confidence (0-100) for a directional signal
    pub confidence_threshold: f64,
    /// Where breakout buys skip the confidence threshold
    pub breakout_exemption: BreakoutExemption,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Moving-average half window
    pub smoothing_window: usize,
    /// Swing detection neighbours per side
    pub swing_window: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Default CSV path for `--ledger` when none is given
    pub csv_path: String,
}
