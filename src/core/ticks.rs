//! Fixed-resolution integer timestamps.
//!
//! Readings are timestamped in ticks: 100-nanosecond intervals since
//! 0001-01-01T00:00:00 on the reading's own wall clock. Integer ticks keep
//! ordering and sub-millisecond precision intact through JSON.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// Ticks between 0001-01-01 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// A timestamp in 100 ns ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticks(pub i64);

impl Ticks {
    /// Convert a wall-clock time to ticks. Precision below 100 ns is dropped.
    pub fn from_naive(time: NaiveDateTime) -> Self {
        let utc = time.and_utc();
        let sub_ticks = i64::from(utc.timestamp_subsec_nanos()) / NANOS_PER_TICK;
        Ticks(UNIX_EPOCH_TICKS + utc.timestamp() * TICKS_PER_SECOND + sub_ticks)
    }

    /// Ticks of the local clock reading of `time` in its own offset.
    pub fn from_datetime<Tz: TimeZone>(time: &DateTime<Tz>) -> Self {
        Self::from_naive(time.naive_local())
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Back to a wall-clock time, or `None` if out of chrono's range.
    pub fn to_naive(self) -> Option<NaiveDateTime> {
        let since_epoch = self.0 - UNIX_EPOCH_TICKS;
        let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
        let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos).map(|t| t.naive_utc())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Ticks {
    fn from(time: DateTime<Tz>) -> Self {
        Self::from_datetime(&time)
    }
}
