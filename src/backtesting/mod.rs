//! Backtest Ledger
//!
//! Caller-owned history of past predictions:
//! - Append-only record of each call and its realized outcome
//! - Win rate over actionable (non-NEUTRAL) calls
//! - CSV export with a fixed column order

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{Bias, Prediction, SignalTier};

/// Column order of the CSV export
pub const CSV_HEADER: [&str; 13] = [
    "timestamp",
    "imagePath",
    "timeframe",
    "label",
    "confidence",
    "pBull",
    "pBear",
    "signal",
    "stopLoss",
    "target1",
    "target2",
    "rr",
    "confluence",
];

/// One recorded prediction and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub image_path: String,
    pub timeframe_minutes: u32,
    pub prediction: Prediction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub was_correct: bool,
    pub bars_held: u32,
}

impl BacktestResult {
    /// Record a call whose outcome is not known yet
    pub fn open(
        timestamp: i64,
        image_path: impl Into<String>,
        timeframe_minutes: u32,
        prediction: Prediction,
        entry_price: f64,
    ) -> Self {
        Self {
            timestamp,
            image_path: image_path.into(),
            timeframe_minutes,
            prediction,
            entry_price,
            exit_price: entry_price,
            pnl: 0.0,
            was_correct: false,
            bars_held: 0,
        }
    }

    /// Fill in the outcome. PnL follows the predicted direction; a neutral
    /// call carries no position.
    pub fn settle(mut self, exit_price: f64, bars_held: u32) -> Self {
        let direction = match self.prediction.label {
            Bias::Bullish => 1.0,
            Bias::Bearish => -1.0,
            Bias::Neutral => 0.0,
        };
        self.exit_price = exit_price;
        self.bars_held = bars_held;
        self.pnl = direction * (exit_price - self.entry_price);
        self.was_correct = self.pnl > 0.0;
        self
    }

    fn csv_record(&self) -> [String; 13] {
        let p = &self.prediction;
        [
            self.timestamp.to_string(),
            self.image_path.clone(),
            self.timeframe_minutes.to_string(),
            p.label.to_string(),
            p.confidence.to_string(),
            p.p_bull.to_string(),
            p.p_bear.to_string(),
            p.signal.to_string(),
            p.plan.stop_loss.to_string(),
            p.plan.target1.to_string(),
            p.plan.target2.to_string(),
            p.plan.risk_reward.to_string(),
            p.confluence.to_string(),
        ]
    }
}

/// Ledger performance metrics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerMetrics {
    /// Entries recorded
    pub entries: usize,
    /// Entries with a non-NEUTRAL signal
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Win rate in percent over trades (0 without trades)
    pub win_rate: f64,
    /// Sum of trade PnL
    pub total_pnl: f64,
    /// Average confidence over trades
    pub avg_confidence: f64,
}

/// Append-only list of backtest results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestLedger {
    results: Vec<BacktestResult>,
}

impl BacktestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, result: BacktestResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn metrics(&self) -> LedgerMetrics {
        let trades: Vec<&BacktestResult> = self
            .results
            .iter()
            .filter(|r| r.prediction.signal != SignalTier::Neutral)
            .collect();
        if trades.is_empty() {
            return LedgerMetrics {
                entries: self.results.len(),
                ..Default::default()
            };
        }

        let total = trades.len();
        let wins = trades.iter().filter(|r| r.was_correct).count();
        let total_pnl = trades.iter().map(|r| r.pnl).sum();
        let avg_confidence =
            trades.iter().map(|r| r.prediction.confidence).sum::<f64>() / total as f64;

        LedgerMetrics {
            entries: self.results.len(),
            trades: total,
            wins,
            losses: total - wins,
            win_rate: 100.0 * wins as f64 / total as f64,
            total_pnl,
            avg_confidence,
        }
    }

    /// CSV text: header plus one unquoted row per entry.
    pub fn export_csv(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = self.write_rows(&mut buf, true) {
            tracing::error!(error = %e, "Failed to serialize backtest ledger");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the same rows as [`export_csv`](Self::export_csv) to `path`,
    /// replacing any existing file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create ledger CSV {}", path.display()))?;
        self.write_rows(file, true)?;

        tracing::info!(path = %path.display(), rows = self.results.len(), "Saved backtest ledger");
        Ok(())
    }

    /// Append rows to `path`, writing the header only when the file is new.
    pub fn append_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open ledger CSV {}", path.display()))?;
        self.write_rows(file, is_new)?;

        tracing::info!(
            path = %path.display(),
            rows = self.results.len(),
            "Appended to backtest ledger"
        );
        Ok(())
    }

    fn write_rows<W: Write>(&self, sink: W, header: bool) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(sink);
        if header {
            writer.write_record(CSV_HEADER)?;
        }
        for result in &self.results {
            writer.write_record(result.csv_record())?;
        }
        writer.flush()?;
        Ok(())
    }
}
