//! The `Idle` / `Collecting` state machine driving one session at a time.

use crate::core::SessionRecording;
use crate::device::{DeviceInfo, DeviceManager};
use crate::error::{Operation, SessionError};
use crate::session::collector::RecordingCollector;
use crate::session::device_session::DeviceSession;
use crate::session::subscriptions::{start_all, stop_all, SensorSubscriptions};
use crate::stats::{create_shared_counters, SharedReadingCounters};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Limits applied to device operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub stream: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            stream: Duration::from_secs(10),
        }
    }
}

/// Coarse recorder state, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Collecting,
}

struct ActiveCollection {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    session: DeviceSession,
    handlers: SensorSubscriptions,
    collector: RecordingCollector,
}

/// A finished session: the buffers plus anything that went wrong tearing down.
#[derive(Debug)]
pub struct CompletedSession {
    pub session_id: Uuid,
    pub device: DeviceInfo,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub recording: SessionRecording,
    /// Stream stop or disconnect failures. The recording is still complete.
    pub teardown_errors: Vec<SessionError>,
}

/// Drives discovery and the collect/stop cycle against a [`DeviceManager`].
pub struct Recorder {
    manager: Arc<dyn DeviceManager>,
    timeouts: Timeouts,
    selected: Option<DeviceInfo>,
    active: Option<ActiveCollection>,
    counters: SharedReadingCounters,
}

impl Recorder {
    pub fn new(manager: Arc<dyn DeviceManager>, timeouts: Timeouts) -> Self {
        Self {
            manager,
            timeouts,
            selected: None,
            active: None,
            counters: create_shared_counters(),
        }
    }

    /// Every device the manager can see, without changing the selection.
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, SessionError> {
        tokio::time::timeout(self.timeouts.connect, self.manager.list_devices())
            .await
            .map_err(|_| SessionError::Timeout {
                operation: Operation::Discover,
                after: self.timeouts.connect,
            })?
            .map_err(SessionError::Connection)
    }

    /// Find devices and select the first one.
    pub async fn discover(&mut self) -> Result<&DeviceInfo, SessionError> {
        let first = self
            .list_devices()
            .await?
            .into_iter()
            .next()
            .ok_or(SessionError::NoDeviceFound)?;
        Ok(self.select(first))
    }

    /// Use `device` for the next session.
    pub fn select(&mut self, device: DeviceInfo) -> &DeviceInfo {
        tracing::info!(device = %device.name, "selected device");
        self.selected.insert(device)
    }

    pub fn selected(&self) -> Option<&DeviceInfo> {
        self.selected.as_ref()
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Collecting
        } else {
            RecorderState::Idle
        }
    }

    /// Live counts for the session being collected.
    pub fn counters(&self) -> &SharedReadingCounters {
        &self.counters
    }

    /// `Idle` → `Collecting`: connect, attach handlers and start all streams.
    ///
    /// On any failure the device is released and the recorder stays `Idle`.
    pub async fn start(&mut self) -> Result<Uuid, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::PreconditionViolation(
                "collection is already in progress",
            ));
        }
        let device = self
            .selected
            .clone()
            .ok_or(SessionError::PreconditionViolation("no device selected"))?;

        let session_id = Uuid::new_v4();
        tracing::info!(%session_id, device = %device.name, "starting collection");

        let session =
            DeviceSession::open(self.manager.as_ref(), &device, self.timeouts.connect).await?;

        self.counters.reset();
        let collector = RecordingCollector::spawn(self.counters.clone());
        let handlers = SensorSubscriptions::attach(session.client().clone(), collector.sink());

        if let Err(e) = start_all(session.client().as_ref(), self.timeouts.stream).await {
            tracing::warn!(%session_id, error = %e, "aborting collection");
            handlers.detach();
            if let Err(close_err) = session.close(self.timeouts.connect).await {
                tracing::warn!(%session_id, error = %close_err, "disconnect after failed start");
            }
            // Nothing useful was recorded; just reap the thread.
            let _ = collector.finish();
            return Err(e.into());
        }

        self.active = Some(ActiveCollection {
            session_id,
            started_at: Utc::now(),
            session,
            handlers,
            collector,
        });
        tracing::info!(%session_id, "collecting");
        Ok(session_id)
    }

    /// `Collecting` → `Idle`: stop streams, detach, disconnect, hand back buffers.
    pub async fn stop(&mut self) -> Result<CompletedSession, SessionError> {
        let active = self
            .active
            .take()
            .ok_or(SessionError::PreconditionViolation("no collection in progress"))?;
        let ActiveCollection {
            session_id,
            started_at,
            session,
            handlers,
            collector,
        } = active;

        let mut teardown_errors = Vec::new();
        if let Err(e) = stop_all(session.client().as_ref(), self.timeouts.stream).await {
            tracing::warn!(%session_id, error = %e, "stream stop failed");
            teardown_errors.push(e.into());
        }
        handlers.detach();

        let device = session.device().clone();
        if let Err(e) = session.close(self.timeouts.connect).await {
            tracing::warn!(%session_id, error = %e, "disconnect failed");
            teardown_errors.push(e);
        }

        let recording = collector.finish()?;
        tracing::info!(
            %session_id,
            readings = recording.total(),
            "collection complete"
        );

        Ok(CompletedSession {
            session_id,
            device,
            started_at,
            ended_at: Utc::now(),
            recording,
            teardown_errors,
        })
    }
}
