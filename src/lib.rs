//! chartsight Library
//!
//! Reads candlestick-chart screenshots and turns them into a directional
//! call with a risk-managed trade plan.

pub mod backtesting;
pub mod config;
pub mod error;
pub mod extraction;
pub mod features;
pub mod risk;
pub mod strategy;
pub mod types;

pub use backtesting::{BacktestLedger, BacktestResult, LedgerMetrics};
pub use error::{ChartError, Result};
pub use risk::PriceScale;
pub use strategy::{
    run_pipeline, EngineConfig, MultiTimeframeResult, PredictionContext, SignalEngine, Weights,
};
pub use types::{Bias, PixelGrid, Prediction, Rgb, RgbGrid, SignalTier, Timeframe};
