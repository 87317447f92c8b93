//! Moving-average smoothing

use crate::types::NormalizedSeries;

/// Symmetric moving average with edge clamping.
///
/// Index `i` averages `[max(0, i - window), min(n - 1, i + window)]`, so the
/// window shrinks at the boundaries. `window <= 1` passes the series through.
pub fn smooth(series: &[f64], window: usize) -> NormalizedSeries {
    if window <= 1 || series.is_empty() {
        return series.to_vec();
    }

    let n = series.len();
    (0..n)
        .map(|i| {
            let a = i.saturating_sub(window);
            let b = (i + window).min(n - 1);
            let slice = &series[a..=b];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_one_is_passthrough() {
        let s = vec![0.1, 0.9, 0.3];
        assert_eq!(smooth(&s, 1), s);
        assert_eq!(smooth(&s, 0), s);
    }

    #[test]
    fn test_edges_use_clamped_window() {
        let s = vec![0.0, 0.3, 0.6, 0.9, 0.0];
        let out = smooth(&s, 2);
        // i=0 → [0..=2]
        assert!((out[0] - 0.3).abs() < 1e-12);
        // i=2 → [0..=4]
        assert!((out[2] - 0.36).abs() < 1e-12);
        // i=4 → [2..=4]
        assert!((out[4] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_unchanged() {
        let s = vec![0.42; 20];
        assert!(smooth(&s, 3).iter().all(|&v| (v - 0.42).abs() < 1e-12));
    }

    #[test]
    fn test_empty_series() {
        assert!(smooth(&[], 3).is_empty());
    }
}
