//! Session-time adjustments
//!
//! US equity session windows scale how much a chart reading is trusted:
//! premarket and after-hours are discounted, and the minutes around the
//! 09:30 open are damped further because the first bars are noisy.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// 04:00
const PREMARKET_OPEN: u32 = 4 * 60;
/// 09:30
pub const REGULAR_OPEN: u32 = 9 * 60 + 30;
/// 16:00
const REGULAR_CLOSE: u32 = 16 * 60;

const PREMARKET_MULT: f64 = 0.85;
const REGULAR_MULT: f64 = 1.00;
const OFF_HOURS_MULT: f64 = 0.90;

/// Minutes on either side of the open that get damped
const OPEN_DECAY_WINDOW: u32 = 10;
/// Multiplier exactly at the open
const OPEN_DECAY_FLOOR: f64 = 0.70;

/// Minutes since midnight, or unknown when the input was malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionTime(Option<u32>);

impl SessionTime {
    pub const UNKNOWN: SessionTime = SessionTime(None);

    /// Parse a 24-hour `HH:MM` string. Anything else is unknown, not an error.
    pub fn parse(hhmm: &str) -> Self {
        let minutes = time_to_minutes(hhmm);
        if minutes.is_none() {
            tracing::debug!(input = %hhmm, "Unrecognized session time, using neutral adjustment");
        }
        SessionTime(minutes)
    }

    pub fn from_minutes(minutes: u32) -> Self {
        if minutes < 24 * 60 {
            SessionTime(Some(minutes))
        } else {
            SessionTime::UNKNOWN
        }
    }

    pub fn minutes(&self) -> Option<u32> {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }

    /// Premarket 0.85, regular session 1.00, otherwise 0.90; unknown 1.0.
    pub fn time_of_day_multiplier(&self) -> f64 {
        match self.0 {
            None => 1.0,
            Some(m) if (PREMARKET_OPEN..REGULAR_OPEN).contains(&m) => PREMARKET_MULT,
            Some(m) if (REGULAR_OPEN..=REGULAR_CLOSE).contains(&m) => REGULAR_MULT,
            Some(_) => OFF_HOURS_MULT,
        }
    }

    /// Linear ramp from 0.70 at 09:30 to 1.00 ten minutes either side.
    pub fn open_proximity_decay(&self) -> f64 {
        let Some(m) = self.0 else {
            return 1.0;
        };
        let dist = m.abs_diff(REGULAR_OPEN);
        if dist > OPEN_DECAY_WINDOW {
            return 1.0;
        }
        let t = dist as f64 / OPEN_DECAY_WINDOW as f64;
        (OPEN_DECAY_FLOOR + (1.0 - OPEN_DECAY_FLOOR) * t).clamp(OPEN_DECAY_FLOOR, 1.0)
    }

    /// Product of both multipliers
    pub fn score_multiplier(&self) -> f64 {
        self.time_of_day_multiplier() * self.open_proximity_decay()
    }
}

impl From<NaiveTime> for SessionTime {
    fn from(t: NaiveTime) -> Self {
        SessionTime(Some(t.hour() * 60 + t.minute()))
    }
}

/// `"HH:MM"` → minutes since midnight. Wrong length, a missing colon or an
/// out-of-range field gives `None`.
pub fn time_to_minutes(hhmm: &str) -> Option<u32> {
    if hhmm.len() != 5 || hhmm.as_bytes()[2] != b':' {
        return None;
    }
    let t = NaiveTime::parse_from_str(hhmm, "%H:%M").ok()?;
    Some(t.hour() * 60 + t.minute())
}
