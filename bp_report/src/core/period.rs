//! Fixed day segments.
//!
//! Every sample belongs to exactly one [`Period`], decided by the hour of
//! its timestamp:
//!
//! | Period  | Hours    |
//! |---------|----------|
//! | Morning | [0, 10)  |
//! | Midday  | [10, 16) |
//! | Evening | [16, 24) |
//!
//! [`Period::classify`] is the only place these boundaries live.

use std::fmt;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

const MIDDAY_START_HOUR: u32 = 10;
const EVENING_START_HOUR: u32 = 16;

/// One of the three day segments, ordered as they occur in a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Morning,
    Midday,
    Evening,
}

impl Period {
    /// All periods in their fixed output order.
    pub const ALL: [Period; 3] = [Period::Morning, Period::Midday, Period::Evening];

    /// Classify a timestamp by its hour of day.
    pub fn classify<T: Timelike>(time: &T) -> Self {
        Self::from_hour(time.hour())
    }

    /// Classify an hour of day. Hours past 23 count as evening.
    pub fn from_hour(hour: u32) -> Self {
        if hour < MIDDAY_START_HOUR {
            Period::Morning
        } else if hour < EVENING_START_HOUR {
            Period::Midday
        } else {
            Period::Evening
        }
    }

    /// Position in [`Period::ALL`].
    pub fn index(self) -> usize {
        match self {
            Period::Morning => 0,
            Period::Midday => 1,
            Period::Evening => 2,
        }
    }

    /// Stable machine key, also used as the scope name.
    pub fn key(self) -> &'static str {
        match self {
            Period::Morning => "morning",
            Period::Midday => "midday",
            Period::Evening => "evening",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
