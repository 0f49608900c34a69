//! Session lifecycle: device connection, stream subscriptions, buffering.
//!
//! ```text
//!   Idle ──start()──▶ Collecting ──stop()──▶ Idle
//!    │                    │
//!    │ connect            │ stop streams, detach handlers,
//!    │ attach handlers    │ disconnect, drain buffers
//!    │ start streams      ▼
//!    ▼               CompletedSession
//! ```

pub mod collector;
pub mod device_session;
pub mod recorder;
pub mod subscriptions;

pub use collector::RecordingCollector;
pub use device_session::DeviceSession;
pub use recorder::{CompletedSession, Recorder, RecorderState, Timeouts};
pub use subscriptions::{start_all, stop_all, SensorSubscriptions};
