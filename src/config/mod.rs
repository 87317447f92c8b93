//! Configuration management for chartsight
//!
//! Loads from optional config files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::extraction::ColorConfig;
use crate::strategy::{EngineConfig, Weights};

/// Largest smoothing or swing window accepted from configuration
pub const MAX_WINDOW: usize = 1_000;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub colors: ColorsConfig,
    pub weights: WeightsConfig,
    pub signal: SignalConfig,
    pub analysis: AnalysisConfig,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::with_defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (CHARTSIGHT__*)
            .add_source(Environment::with_prefix("CHARTSIGHT").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self> {
        Self::with_defaults()?
            .build()
            .context("Failed to build default configuration")?
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Candle colors
            .set_default("colors.bull.r", 40)?
            .set_default("colors.bull.g", 220)?
            .set_default("colors.bull.b", 140)?
            .set_default("colors.bear.r", 220)?
            .set_default("colors.bear.g", 60)?
            .set_default("colors.bear.b", 220)?
            .set_default("colors.tolerance", 45)?
            // Scorer weights
            .set_default("weights.trend", 1.6)?
            .set_default("weights.momentum", 0.35)?
            .set_default("weights.reversal", 1.2)?
            .set_default("weights.sr", 0.6)?
            // Signal grading
            .set_default("signal.confidence_threshold", 60.0)?
            .set_default("signal.breakout_exemption", "single_timeframe")?
            // Structure analysis
            .set_default("analysis.smoothing_window", 3)?
            .set_default("analysis.swing_window", 8)?
            // Ledger
            .set_default("ledger.csv_path", "./data/ledger.csv")?;
        Ok(builder)
    }

    /// Reject values the engine cannot use
    pub fn validate(&self) -> Result<()> {
        let t = self.signal.confidence_threshold;
        if !(0.0..=100.0).contains(&t) {
            bail!("signal.confidence_threshold must be within 0-100, got {}", t);
        }
        let w = &self.weights;
        if [w.trend, w.momentum, w.reversal, w.sr]
            .iter()
            .any(|v| !v.is_finite())
        {
            bail!("weights must be finite numbers");
        }
        let a = &self.analysis;
        if a.smoothing_window > MAX_WINDOW {
            bail!(
                "analysis.smoothing_window must be at most {}, got {}",
                MAX_WINDOW,
                a.smoothing_window
            );
        }
        if a.swing_window == 0 || a.swing_window > MAX_WINDOW {
            bail!(
                "analysis.swing_window must be within 1-{}, got {}",
                MAX_WINDOW,
                a.swing_window
            );
        }
        Ok(())
    }

    /// Engine configuration built from these settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            colors: ColorConfig {
                bull: self.colors.bull,
                bear: self.colors.bear,
                tolerance: self.colors.tolerance,
            },
            weights: Weights {
                trend: self.weights.trend,
                momentum: self.weights.momentum,
                reversal: self.weights.reversal,
                sr: self.weights.sr,
            },
            confidence_threshold: self.signal.confidence_threshold,
            breakout_exemption: self.signal.breakout_exemption,
            smoothing_window: self.analysis.smoothing_window,
            swing_window: self.analysis.swing_window,
        }
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "weights=({:.2},{:.2},{:.2},{:.2}) threshold={:.0} exemption={:?} \
             windows=({},{}) tolerance={}",
            self.weights.trend,
            self.weights.momentum,
            self.weights.reversal,
            self.weights.sr,
            self.signal.confidence_threshold,
            self.signal.breakout_exemption,
            self.analysis.smoothing_window,
            self.analysis.swing_window,
            self.colors.tolerance
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
