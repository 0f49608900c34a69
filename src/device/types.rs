//! Reading types produced by the six wearable sensor streams.
//!
//! Field names serialize in PascalCase, which is the layout of the session
//! report. Enumerations serialize as their numeric discriminants.

use crate::core::Ticks;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// The six sensor streams, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Calories,
    Distance,
    Gyroscope,
    HeartRate,
    SkinTemperature,
}

impl SensorKind {
    pub const ALL: [SensorKind; 6] = [
        SensorKind::Accelerometer,
        SensorKind::Calories,
        SensorKind::Distance,
        SensorKind::Gyroscope,
        SensorKind::HeartRate,
        SensorKind::SkinTemperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Calories => "calories",
            SensorKind::Distance => "distance",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::HeartRate => "heart rate",
            SensorKind::SkinTemperature => "skin temperature",
        }
    }

    /// Position in [`SensorKind::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Motion state reported alongside distance readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MotionType {
    Unknown = 0,
    Idle = 1,
    Walking = 2,
    Jogging = 3,
    Running = 4,
}

/// Whether the heart rate sensor has a lock on the pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum HeartRateQuality {
    Acquiring = 0,
    Locked = 1,
}

/// Acceleration in g along each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccelerometerReading {
    #[serde(with = "json_float")]
    pub acceleration_x: f64,
    #[serde(with = "json_float")]
    pub acceleration_y: f64,
    #[serde(with = "json_float")]
    pub acceleration_z: f64,
    pub timestamp: Ticks,
}

/// Cumulative calories burned since the device was reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaloriesReading {
    pub calories: i64,
    pub timestamp: Ticks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DistanceReading {
    pub current_motion: MotionType,
    /// Centimeters. Existing report consumers expect the historical key spelling.
    #[serde(rename = "TotalDisatnce", alias = "TotalDistance", with = "json_float")]
    pub total_distance: f64,
    /// Centimeters per second
    #[serde(with = "json_float")]
    pub speed: f64,
    /// Milliseconds per meter
    #[serde(with = "json_float")]
    pub pace: f64,
    pub timestamp: Ticks,
}

/// Angular velocity in degrees per second along each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GyroscopeReading {
    #[serde(with = "json_float")]
    pub angular_velocity_x: f64,
    #[serde(with = "json_float")]
    pub angular_velocity_y: f64,
    #[serde(with = "json_float")]
    pub angular_velocity_z: f64,
    pub timestamp: Ticks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeartRateReading {
    /// Beats per minute
    pub heart_rate: i32,
    pub quality: HeartRateQuality,
    pub timestamp: Ticks,
}

/// Skin temperature in degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkinTemperatureReading {
    #[serde(with = "json_float")]
    pub temperature: f64,
    pub timestamp: Ticks,
}

/// A reading from any of the six streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorReading {
    Accelerometer(AccelerometerReading),
    Calories(CaloriesReading),
    Distance(DistanceReading),
    Gyroscope(GyroscopeReading),
    HeartRate(HeartRateReading),
    SkinTemperature(SkinTemperatureReading),
}

impl SensorReading {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorReading::Accelerometer(_) => SensorKind::Accelerometer,
            SensorReading::Calories(_) => SensorKind::Calories,
            SensorReading::Distance(_) => SensorKind::Distance,
            SensorReading::Gyroscope(_) => SensorKind::Gyroscope,
            SensorReading::HeartRate(_) => SensorKind::HeartRate,
            SensorReading::SkinTemperature(_) => SensorKind::SkinTemperature,
        }
    }
}

/// Identifies a discoverable device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    /// Transport-specific address (e.g. a Bluetooth MAC)
    pub address: String,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// `f64` fields that survive JSON even when not finite.
///
/// JSON has no NaN or infinity, so those are written as the strings `"NaN"`,
/// `"Infinity"` and `"-Infinity"`. Plain numbers are unchanged.
mod json_float {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};

    const EXPECTED: &str = "a number, \"NaN\", \"Infinity\" or \"-Infinity\"";

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::invalid_value(Unexpected::Str(other), &EXPECTED)),
            },
        }
    }
}
