//! Candle color classification

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// Which candle body a pixel belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleColor {
    Bull,
    Bear,
}

/// True iff every channel of `pixel` is within `tolerance` of `target`.
pub fn matches(pixel: Rgb, target: Rgb, tolerance: u8) -> bool {
    let tol = i16::from(tolerance);
    (i16::from(pixel.r) - i16::from(target.r)).abs() <= tol
        && (i16::from(pixel.g) - i16::from(target.g)).abs() <= tol
        && (i16::from(pixel.b) - i16::from(target.b)).abs() <= tol
}

/// Candle colors of the screenshot style being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorConfig {
    /// Bullish candle body (green-ish)
    pub bull: Rgb,
    /// Bearish candle body (magenta-ish)
    pub bear: Rgb,
    /// Per-channel tolerance
    pub tolerance: u8,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            bull: Rgb::new(40, 220, 140),
            bear: Rgb::new(220, 60, 220),
            tolerance: 45,
        }
    }
}

impl ColorConfig {
    /// Bull wins when a pixel is close to both colors.
    pub fn classify(&self, pixel: Rgb) -> Option<CandleColor> {
        if matches(pixel, self.bull, self.tolerance) {
            Some(CandleColor::Bull)
        } else if matches(pixel, self.bear, self.tolerance) {
            Some(CandleColor::Bear)
        } else {
            None
        }
    }

    pub fn is_candle(&self, pixel: Rgb) -> bool {
        self.classify(pixel).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_within_tolerance() {
        let target = Rgb::new(40, 220, 140);
        assert!(matches(Rgb::new(40, 220, 140), target, 0));
        assert!(matches(Rgb::new(85, 175, 185), target, 45));
        assert!(!matches(Rgb::new(86, 220, 140), target, 45));
        assert!(!matches(Rgb::new(40, 220, 94), target, 45));
    }

    #[test]
    fn test_matches_handles_channel_extremes() {
        assert!(matches(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255), 255));
        assert!(!matches(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255), 254));
    }

    #[test]
    fn test_classify_default_colors() {
        let colors = ColorConfig::default();
        assert_eq!(colors.classify(Rgb::new(50, 210, 130)), Some(CandleColor::Bull));
        assert_eq!(colors.classify(Rgb::new(210, 70, 215)), Some(CandleColor::Bear));
        assert_eq!(colors.classify(Rgb::new(25, 25, 25)), None);
        assert!(!colors.is_candle(Rgb::new(255, 255, 255)));
    }
}
