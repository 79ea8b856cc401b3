//! Playback speed setting.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("speed must be within {min}..={max}, got {value}", min = Speed::MIN, max = Speed::MAX)]
pub struct SpeedOutOfRange {
    pub value: i64,
}

/// Delay between playback ticks, as a setting in `-5..=9`.
///
/// Negative settings are whole seconds (`-3` is three seconds), positive ones
/// shorten the default one second in 100 ms steps (`9` is 100 ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Speed(i8);

impl Speed {
    pub const MIN: i8 = -5;
    pub const MAX: i8 = 9;

    pub fn new(value: i64) -> Result<Self, SpeedOutOfRange> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            // In range, so the narrowing cannot truncate.
            Ok(Self(value as i8))
        } else {
            Err(SpeedOutOfRange { value })
        }
    }

    pub fn value(self) -> i8 {
        self.0
    }

    pub fn delay(self) -> Duration {
        match self.0 {
            v if v < 0 => Duration::from_secs(u64::from(v.unsigned_abs())),
            0 => Duration::from_millis(1000),
            v => Duration::from_millis(u64::from((10 - v).unsigned_abs()) * 100),
        }
    }

    /// One notch faster, saturating at the maximum.
    pub fn faster(self) -> Self {
        Self((self.0 + 1).min(Self::MAX))
    }

    /// One notch slower, saturating at the minimum.
    pub fn slower(self) -> Self {
        Self((self.0 - 1).max(Self::MIN))
    }
}

impl TryFrom<i64> for Speed {
    type Error = SpeedOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Speed> for i64 {
    fn from(speed: Speed) -> Self {
        i64::from(speed.0)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
