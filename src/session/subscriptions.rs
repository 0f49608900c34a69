//! The six sensor streams, started, stopped and subscribed as one unit.

use crate::device::{DeviceClient, ReadingSink, SensorKind, SubscriptionToken};
use crate::error::{StreamFailure, StreamFailureCause, StreamOp, StreamStartError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Issue `op` to all six streams concurrently and wait for every one.
async fn run_batch(
    client: &dyn DeviceClient,
    op: StreamOp,
    kinds: &[SensorKind],
    limit: Duration,
) -> Vec<(SensorKind, Result<(), StreamFailureCause>)> {
    let requests = kinds.iter().map(|&kind| async move {
        let request = async {
            match op {
                StreamOp::Start => client.start_readings(kind).await,
                StreamOp::Stop => client.stop_readings(kind).await,
            }
        };
        let outcome = match timeout(limit, request).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(StreamFailureCause::Device(e)),
            Err(_) => Err(StreamFailureCause::TimedOut(limit)),
        };
        (kind, outcome)
    });
    join_all(requests).await
}

fn collect_failures(
    results: &[(SensorKind, Result<(), StreamFailureCause>)],
) -> Vec<StreamFailure> {
    results
        .iter()
        .filter_map(|(kind, outcome)| {
            outcome.as_ref().err().map(|cause| StreamFailure {
                kind: *kind,
                cause: cause.clone(),
            })
        })
        .collect()
}

/// Start all six streams.
///
/// Every start request runs to completion. If any fails, the streams that did
/// start are stopped again and the failures are returned together.
pub async fn start_all(client: &dyn DeviceClient, limit: Duration) -> Result<(), StreamStartError> {
    let results = run_batch(client, StreamOp::Start, &SensorKind::ALL, limit).await;
    let failures = collect_failures(&results);
    if failures.is_empty() {
        tracing::debug!("all sensor streams started");
        return Ok(());
    }

    let started: Vec<SensorKind> = results
        .iter()
        .filter(|(_, outcome)| outcome.is_ok())
        .map(|(kind, _)| *kind)
        .collect();
    if !started.is_empty() {
        tracing::warn!(count = started.len(), "rolling back started sensor streams");
        let rollback = run_batch(client, StreamOp::Stop, &started, limit).await;
        for failure in collect_failures(&rollback) {
            tracing::warn!(sensor = %failure.kind, cause = %failure.cause, "rollback stop failed");
        }
    }

    Err(StreamStartError {
        operation: StreamOp::Start,
        failures,
    })
}

/// Stop all six streams, best-effort.
pub async fn stop_all(client: &dyn DeviceClient, limit: Duration) -> Result<(), StreamStartError> {
    let results = run_batch(client, StreamOp::Stop, &SensorKind::ALL, limit).await;
    let failures = collect_failures(&results);
    if failures.is_empty() {
        tracing::debug!("all sensor streams stopped");
        Ok(())
    } else {
        Err(StreamStartError {
            operation: StreamOp::Stop,
            failures,
        })
    }
}

/// Reading handlers registered on every stream of a device.
///
/// [`SensorSubscriptions::detach`] consumes the value; dropping it without
/// detaching unregisters whatever is still attached.
pub struct SensorSubscriptions {
    client: Arc<dyn DeviceClient>,
    tokens: Vec<SubscriptionToken>,
}

impl SensorSubscriptions {
    /// Route every stream's readings into `sink`.
    pub fn attach(client: Arc<dyn DeviceClient>, sink: &ReadingSink) -> Self {
        let tokens = SensorKind::ALL
            .iter()
            .map(|&kind| client.subscribe(kind, sink.clone()))
            .collect();
        Self { client, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        for token in self.tokens.drain(..) {
            self.client.unsubscribe(token);
        }
    }
}

impl Drop for SensorSubscriptions {
    fn drop(&mut self) {
        self.release();
    }
}
