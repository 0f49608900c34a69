//! Single consumer that appends delivered readings to the session buffers.
//!
//! Device callbacks may fire on any thread; they only ever send into the
//! channel. The collector thread is the sole owner of the
//! [`SessionRecording`] until [`RecordingCollector::finish`] hands it back.

use crate::core::SessionRecording;
use crate::device::{ReadingSink, SensorReading};
use crate::error::SessionError;
use crate::stats::SharedReadingCounters;
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

pub struct RecordingCollector {
    sink: ReadingSink,
    stop: Sender<()>,
    handle: JoinHandle<SessionRecording>,
}

impl RecordingCollector {
    /// Start a collector with a fresh, empty recording.
    pub fn spawn(counters: SharedReadingCounters) -> Self {
        // Unbounded so a slow consumer never forces the device to drop readings.
        let (sink, readings) = unbounded();
        let (stop, stop_rx) = bounded(1);
        let handle = thread::spawn(move || collect(readings, stop_rx, counters));
        Self { sink, stop, handle }
    }

    /// Sender to register with the device streams.
    pub fn sink(&self) -> &ReadingSink {
        &self.sink
    }

    /// Drain everything delivered so far and return the recording.
    ///
    /// Call after the streams are stopped and handlers detached; readings sent
    /// after this point are not recorded.
    pub fn finish(self) -> Result<SessionRecording, SessionError> {
        let Self { sink, stop, handle } = self;
        drop(sink);
        let _ = stop.send(());
        handle.join().map_err(|_| SessionError::CollectorPanicked)
    }
}

fn collect(
    readings: Receiver<SensorReading>,
    stop: Receiver<()>,
    counters: SharedReadingCounters,
) -> SessionRecording {
    let mut recording = SessionRecording::new();
    let mut append = |reading: SensorReading| {
        counters.record(reading.kind());
        recording.append(reading);
    };

    loop {
        // None on a stop request, or once every sender is gone.
        let next = select! {
            recv(readings) -> msg => msg.ok(),
            recv(stop) -> _ => None,
        };
        match next {
            Some(reading) => append(reading),
            None => {
                readings.try_iter().for_each(&mut append);
                break;
            }
        }
    }

    recording
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Ticks;
    use crate::device::{CaloriesReading, SensorKind};
    use crate::stats::create_shared_counters;

    fn calories(n: i64) -> SensorReading {
        SensorReading::Calories(CaloriesReading {
            calories: n,
            timestamp: Ticks(n),
        })
    }

    #[test]
    fn test_collects_everything_sent_before_finish() {
        let counters = create_shared_counters();
        let collector = RecordingCollector::spawn(counters.clone());

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let sink = collector.sink().clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        sink.send(calories(p * 1000 + i)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let recording = collector.finish().unwrap();
        assert_eq!(recording.len(SensorKind::Calories), 1000);
        assert_eq!(counters.count(SensorKind::Calories), 1000);
    }

    #[test]
    fn test_per_producer_order_is_kept() {
        let collector = RecordingCollector::spawn(create_shared_counters());
        for i in 0..100 {
            collector.sink().send(calories(i)).unwrap();
        }
        let recording = collector.finish().unwrap();
        let values: Vec<i64> = recording.calories.iter().map(|r| r.calories).collect();
        assert_eq!(values, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_session() {
        let collector = RecordingCollector::spawn(create_shared_counters());
        let recording = collector.finish().unwrap();
        assert!(recording.is_empty());
    }
}
