//! Core data handling for band-sensor-dump.
//!
//! This module contains:
//! - Tick timestamps used for lossless serialization
//! - The per-session reading buffers

pub mod recording;
pub mod ticks;

// Re-export commonly used types
pub use recording::SessionRecording;
pub use ticks::{Ticks, TICKS_PER_SECOND, UNIX_EPOCH_TICKS};
