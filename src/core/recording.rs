//! In-memory buffers for one recording session.

use crate::device::types::{
    AccelerometerReading, CaloriesReading, DistanceReading, GyroscopeReading, HeartRateReading,
    SensorKind, SensorReading, SkinTemperatureReading,
};

/// The six append-only reading buffers of a session.
///
/// A fresh recording is created when collection starts; readings are only
/// ever appended, in delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRecording {
    pub accelerometer: Vec<AccelerometerReading>,
    pub calories: Vec<CaloriesReading>,
    pub distance: Vec<DistanceReading>,
    pub gyroscope: Vec<GyroscopeReading>,
    pub heart_rate: Vec<HeartRateReading>,
    pub skin_temperature: Vec<SkinTemperatureReading>,
}

impl SessionRecording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reading to the buffer of its kind.
    pub fn append(&mut self, reading: SensorReading) {
        match reading {
            SensorReading::Accelerometer(r) => self.accelerometer.push(r),
            SensorReading::Calories(r) => self.calories.push(r),
            SensorReading::Distance(r) => self.distance.push(r),
            SensorReading::Gyroscope(r) => self.gyroscope.push(r),
            SensorReading::HeartRate(r) => self.heart_rate.push(r),
            SensorReading::SkinTemperature(r) => self.skin_temperature.push(r),
        }
    }

    /// Number of readings buffered for `kind`.
    pub fn len(&self, kind: SensorKind) -> usize {
        match kind {
            SensorKind::Accelerometer => self.accelerometer.len(),
            SensorKind::Calories => self.calories.len(),
            SensorKind::Distance => self.distance.len(),
            SensorKind::Gyroscope => self.gyroscope.len(),
            SensorKind::HeartRate => self.heart_rate.len(),
            SensorKind::SkinTemperature => self.skin_temperature.len(),
        }
    }

    pub fn total(&self) -> usize {
        SensorKind::ALL.iter().map(|kind| self.len(*kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
