//! Errors raised while driving a recording session.

use crate::device::{DeviceError, SensorKind};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Device operations that run under a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Discover,
    Connect,
    Disconnect,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Discover => f.write_str("discover"),
            Operation::Connect => f.write_str("connect"),
            Operation::Disconnect => f.write_str("disconnect"),
        }
    }
}

/// Whether a stream batch was starting or stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOp {
    Start,
    Stop,
}

impl fmt::Display for StreamOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOp::Start => f.write_str("start"),
            StreamOp::Stop => f.write_str("stop"),
        }
    }
}

/// Why an individual stream failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamFailureCause {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// One failed stream within a start/stop batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFailure {
    pub kind: SensorKind,
    pub cause: StreamFailureCause,
}

/// Every failure from a start or stop batch.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to {} {} sensor stream(s): {}", .operation, .failures.len(), describe(.failures))]
pub struct StreamStartError {
    pub operation: StreamOp,
    pub failures: Vec<StreamFailure>,
}

impl StreamStartError {
    pub fn failed_kinds(&self) -> Vec<SensorKind> {
        self.failures.iter().map(|f| f.kind).collect()
    }
}

fn describe(failures: &[StreamFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.kind, f.cause))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from the session lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no bands found")]
    NoDeviceFound,

    #[error("connection error: {0}")]
    Connection(#[source] DeviceError),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: Operation, after: Duration },

    #[error(transparent)]
    StreamStart(#[from] StreamStartError),

    /// A caller broke the session contract; this is a bug, not a runtime condition.
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),

    #[error("reading collector thread panicked")]
    CollectorPanicked,
}

impl SessionError {
    /// Whether the error reflects a programming mistake rather than a device problem.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, SessionError::PreconditionViolation(_))
    }
}
