//! Series Extraction
//!
//! Reads a chart screenshot column by column and turns candle pixels into:
//! - a normalized close series (top of the plot = 1.0)
//! - a normalized volume series from the indicator panel
//!
//! Columns without any candle pixel are filled from their neighbours.

pub mod color;
pub use color::{matches, CandleColor, ColorConfig};

pub mod decode;
pub use decode::load_grid;

use crate::types::{NormalizedSeries, PixelGrid};

/// Fractions of the screenshot cropped away before reading candles
const CROP_TOP: f64 = 0.10;
const CROP_BOTTOM: f64 = 0.25;
const CROP_LEFT: f64 = 0.03;
const CROP_RIGHT: f64 = 0.02;

/// Vertical band holding the volume panel
const VOLUME_TOP: f64 = 0.74;
const VOLUME_BOTTOM: f64 = 0.89;

/// Close value assumed when no column resolved (mid-price)
pub const CLOSE_FALLBACK: f64 = 0.5;
/// Volume assumed when no column resolved (no volume)
pub const VOLUME_FALLBACK: f64 = 0.0;

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

impl Region {
    fn columns(&self) -> std::ops::Range<usize> {
        self.x0..self.x1.max(self.x0)
    }

    fn rows(&self) -> std::ops::Range<usize> {
        self.y0..self.y1.max(self.y0)
    }

    fn row_span(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }
}

fn fraction(total: usize, frac: f64) -> usize {
    (total as f64 * frac) as usize
}

fn horizontal_crop(width: usize) -> (usize, usize) {
    let x0 = fraction(width, CROP_LEFT);
    let x1 = width.saturating_sub(fraction(width, CROP_RIGHT));
    (x0, x1)
}

fn price_region(width: usize, height: usize) -> Region {
    let (x0, x1) = horizontal_crop(width);
    Region {
        x0,
        x1,
        y0: fraction(height, CROP_TOP),
        y1: height.saturating_sub(fraction(height, CROP_BOTTOM)),
    }
}

fn volume_region(width: usize, height: usize) -> Region {
    let (x0, x1) = horizontal_crop(width);
    Region {
        x0,
        x1,
        y0: fraction(height, VOLUME_TOP),
        y1: fraction(height, VOLUME_BOTTOM),
    }
}

/// Close series: one value per column of the cropped price area.
///
/// The majority candle color of a column decides which edge is the close:
/// the topmost bull pixel, or the bottommost bear pixel.
pub fn extract_close<G: PixelGrid + ?Sized>(grid: &G, colors: &ColorConfig) -> NormalizedSeries {
    let region = price_region(grid.width(), grid.height());
    let span = region.row_span();

    let raw: Vec<Option<f64>> = region
        .columns()
        .map(|x| {
            let mut bull_count = 0usize;
            let mut bear_count = 0usize;
            let mut top_bull: Option<usize> = None;
            let mut bottom_bear: Option<usize> = None;

            for y in region.rows() {
                match colors.classify(grid.pixel(x, y)) {
                    Some(CandleColor::Bull) => {
                        bull_count += 1;
                        top_bull.get_or_insert(y);
                    }
                    Some(CandleColor::Bear) => {
                        bear_count += 1;
                        bottom_bear = Some(y);
                    }
                    None => {}
                }
            }

            let close_row = if bull_count > bear_count {
                top_bull?
            } else {
                bottom_bear?
            };

            let norm = 1.0 - (close_row - region.y0) as f64 / span as f64;
            Some(norm.clamp(0.0, 1.0))
        })
        .collect();

    let series = fill_gaps(raw, CLOSE_FALLBACK);
    tracing::debug!(
        columns = series.len(),
        rows = span,
        "extract_close: price area sampled"
    );
    series
}

/// Volume series: height of the contiguous colored bar at the bottom of
/// the volume panel, as a fraction of the panel height.
pub fn extract_volume<G: PixelGrid + ?Sized>(grid: &G, colors: &ColorConfig) -> NormalizedSeries {
    let region = volume_region(grid.width(), grid.height());
    let span = region.row_span();

    let raw: Vec<Option<f64>> = region
        .columns()
        .map(|x| {
            let mut run = 0usize;
            for y in region.rows().rev() {
                if colors.is_candle(grid.pixel(x, y)) {
                    run += 1;
                } else if run > 0 {
                    break;
                }
            }
            (run > 0).then(|| (run as f64 / span as f64).clamp(0.0, 1.0))
        })
        .collect();

    fill_gaps(raw, VOLUME_FALLBACK)
}

/// Forward-fill, then backward-fill; columns still empty take `fallback`.
pub fn fill_gaps(raw: Vec<Option<f64>>, fallback: f64) -> NormalizedSeries {
    let mut filled = raw;

    let mut last = None;
    for v in filled.iter_mut() {
        if v.is_some() {
            last = *v;
        } else {
            *v = last;
        }
    }

    let mut next = None;
    for v in filled.iter_mut().rev() {
        if v.is_some() {
            next = *v;
        } else {
            *v = next;
        }
    }

    filled.into_iter().map(|v| v.unwrap_or(fallback)).collect()
}
