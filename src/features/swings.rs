//! Swing high/low detection

use crate::types::SwingPoint;

/// Smallest move between a kept swing and the next opposite swing
pub const MIN_SWING_MOVE: f64 = 0.02;

/// Strict local extrema over `window` neighbours on each side.
///
/// Ties on either side disqualify a point. The raw list is then cleaned so
/// the result strictly alternates between highs and lows.
pub fn find_swings(series: &[f64], window: usize) -> Vec<SwingPoint> {
    let window = window.max(1);
    let n = series.len();
    if n < 2 * window + 1 {
        return Vec::new();
    }

    let mut raw = Vec::new();
    for i in window..n - window {
        let v = series[i];
        let neighbours = (1..=window).flat_map(|k| [series[i - k], series[i + k]]);

        let mut is_max = true;
        let mut is_min = true;
        for u in neighbours {
            if u >= v {
                is_max = false;
            }
            if u <= v {
                is_min = false;
            }
            if !is_max && !is_min {
                break;
            }
        }

        if is_max {
            raw.push(SwingPoint {
                index: i,
                value: v,
                is_high: true,
            });
        } else if is_min {
            raw.push(SwingPoint {
                index: i,
                value: v,
                is_high: false,
            });
        }
    }

    clean_swings(&raw)
}

/// Merge same-type runs (keep the extreme) and drop reversals smaller than
/// [`MIN_SWING_MOVE`].
pub fn clean_swings(raw: &[SwingPoint]) -> Vec<SwingPoint> {
    let mut cleaned: Vec<SwingPoint> = Vec::with_capacity(raw.len());

    for sp in raw {
        let Some(last) = cleaned.last_mut() else {
            cleaned.push(*sp);
            continue;
        };

        if sp.is_high == last.is_high {
            let more_extreme = if sp.is_high {
                sp.value > last.value
            } else {
                sp.value < last.value
            };
            if more_extreme {
                *last = *sp;
            }
        } else if (sp.value - last.value).abs() >= MIN_SWING_MOVE {
            cleaned.push(*sp);
        }
    }

    cleaned
}
