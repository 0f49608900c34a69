//! band-sensor-dump - record wearable sensor streams into session reports.
//!
//! A session connects to a wearable, starts its six sensor streams together,
//! buffers every reading in memory, and when stopped writes all readings into
//! a single JSON report that can then be mailed on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      band-sensor-dump                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Device    │──▶│  Collector  │──▶│  Recording  │        │
//! │  │ (6 streams) │   │  (channel)  │   │  (buffers)  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         ▲                                    │              │
//! │         │                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐        │
//! │  │  Recorder   │                     │   Report    │──▶ mail │
//! │  │ Idle/Collect│                     │   (JSON)    │        │
//! │  └─────────────┘                     └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use band_sensor_dump::{Recorder, ReportWriter, SimulatedBandManager, SimulationConfig, Timeouts};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(SimulatedBandManager::new(SimulationConfig::default()));
//! let mut recorder = Recorder::new(manager, Timeouts::default());
//!
//! recorder.discover().await?;
//! recorder.start().await?;
//! // ... exercise ...
//! let completed = recorder.stop().await?;
//!
//! let writer = ReportWriter::new("reports");
//! let file = writer.write_today(Some("Running"), &completed.recording)?;
//! println!("wrote {}", file.name);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod device;
pub mod error;
pub mod report;
pub mod session;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{SessionRecording, Ticks};
pub use device::{
    DeviceClient, DeviceError, DeviceInfo, DeviceManager, SensorKind, SensorReading,
    SimulatedBand, SimulatedBandManager, SimulationConfig,
};
pub use error::{SessionError, StreamStartError};
pub use report::{
    MailComposer, MailError, OutboxComposer, ReportError, ReportFile, ReportSender, ReportWriter,
};
pub use session::{CompletedSession, Recorder, RecorderState, Timeouts};
pub use stats::{ReadingCounters, ReadingStats, SharedReadingCounters};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
