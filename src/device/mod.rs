//! Device collaborator boundary.
//!
//! The wearable vendor SDK sits behind [`DeviceManager`] (discovery and
//! connection) and [`DeviceClient`] (one connected device). Readings are
//! delivered into a [`ReadingSink`], a channel sender that may be used from any
//! thread the transport calls back on.

pub mod simulated;
pub mod types;

use async_trait::async_trait;
use crossbeam_channel::Sender;
use std::sync::Arc;
use thiserror::Error;

pub use simulated::{SimulatedBand, SimulatedBandManager, SimulationConfig};
pub use types::{
    AccelerometerReading, CaloriesReading, DeviceInfo, DistanceReading, GyroscopeReading,
    HeartRateQuality, HeartRateReading, MotionType, SensorKind, SensorReading,
    SkinTemperatureReading,
};

/// Where a device pushes readings for a subscribed stream.
pub type ReadingSink = Sender<SensorReading>;

/// Handle returned by [`DeviceClient::subscribe`], consumed by `unsubscribe`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    pub kind: SensorKind,
    pub id: u64,
}

/// Errors reported by the device collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("device {0} is not reachable")]
    Unreachable(String),

    #[error("{kind} sensor unavailable: {reason}")]
    SensorUnavailable { kind: SensorKind, reason: String },

    #[error("device connection is closed")]
    Closed,

    #[error("device error: {0}")]
    Other(String),
}

/// Discovery and connection.
#[async_trait]
pub trait DeviceManager: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    async fn connect(&self, device: &DeviceInfo) -> Result<Arc<dyn DeviceClient>, DeviceError>;
}

/// A connected device exposing the six sensor streams.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    fn info(&self) -> &DeviceInfo;

    async fn start_readings(&self, kind: SensorKind) -> Result<(), DeviceError>;

    async fn stop_readings(&self, kind: SensorKind) -> Result<(), DeviceError>;

    /// Register `sink` to receive every reading produced by the `kind` stream.
    fn subscribe(&self, kind: SensorKind, sink: ReadingSink) -> SubscriptionToken;

    fn unsubscribe(&self, token: SubscriptionToken);

    async fn disconnect(&self) -> Result<(), DeviceError>;
}
