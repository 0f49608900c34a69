//! Live per-sensor reading counts.
//!
//! The reading buffers are owned by the collector thread until a session
//! stops, so progress is reported through these counters instead.

use crate::device::types::SensorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the session currently being collected.
#[derive(Debug)]
pub struct ReadingCounters {
    readings: [AtomicU64; 6],
    session_start: std::sync::Mutex<DateTime<Utc>>,
}

impl ReadingCounters {
    pub fn new() -> Self {
        Self {
            readings: Default::default(),
            session_start: std::sync::Mutex::new(Utc::now()),
        }
    }

    /// Record one appended reading.
    pub fn record(&self, kind: SensorKind) {
        self.readings[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, kind: SensorKind) -> u64 {
        self.readings[kind.index()].load(Ordering::Relaxed)
    }

    /// Zero every counter and restart the session clock.
    pub fn reset(&self) {
        for counter in &self.readings {
            counter.store(0, Ordering::Relaxed);
        }
        let mut start = self
            .session_start
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *start = Utc::now();
    }

    pub fn stats(&self) -> ReadingStats {
        let session_start = *self
            .session_start
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ReadingStats {
            accelerometer: self.count(SensorKind::Accelerometer),
            calories: self.count(SensorKind::Calories),
            distance: self.count(SensorKind::Distance),
            gyroscope: self.count(SensorKind::Gyroscope),
            heart_rate: self.count(SensorKind::HeartRate),
            skin_temperature: self.count(SensorKind::SkinTemperature),
            session_start,
            session_duration_secs: (Utc::now() - session_start).num_seconds().max(0) as u64,
        }
    }

    /// One-line progress summary.
    pub fn status_line(&self) -> String {
        let stats = self.stats();
        format!(
            "[{:>4}s] accel {} | cal {} | dist {} | gyro {} | hr {} | skin {}",
            stats.session_duration_secs,
            stats.accelerometer,
            stats.calories,
            stats.distance,
            stats.gyroscope,
            stats.heart_rate,
            stats.skin_temperature
        )
    }
}

impl Default for ReadingCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the reading counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingStats {
    pub accelerometer: u64,
    pub calories: u64,
    pub distance: u64,
    pub gyroscope: u64,
    pub heart_rate: u64,
    pub skin_temperature: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl ReadingStats {
    pub fn total(&self) -> u64 {
        self.accelerometer
            + self.calories
            + self.distance
            + self.gyroscope
            + self.heart_rate
            + self.skin_temperature
    }
}

/// Thread-safe shared counters.
pub type SharedReadingCounters = Arc<ReadingCounters>;

pub fn create_shared_counters() -> SharedReadingCounters {
    Arc::new(ReadingCounters::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let counters = ReadingCounters::new();
        counters.record(SensorKind::Accelerometer);
        counters.record(SensorKind::Accelerometer);
        counters.record(SensorKind::HeartRate);

        let stats = counters.stats();
        assert_eq!(stats.accelerometer, 2);
        assert_eq!(stats.heart_rate, 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_reset() {
        let counters = ReadingCounters::new();
        counters.record(SensorKind::Gyroscope);
        counters.reset();
        assert_eq!(counters.stats().total(), 0);
    }

    #[test]
    fn test_status_line_format() {
        let counters = ReadingCounters::new();
        counters.record(SensorKind::Calories);
        let line = counters.status_line();
        assert!(line.contains("cal 1"));
        assert!(line.contains("accel 0"));
    }
}
