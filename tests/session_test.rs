//! End-to-end tests: record against a simulated band, write and read back reports.

use band_sensor_dump::device::{
    AccelerometerReading, CaloriesReading, DistanceReading, GyroscopeReading, HeartRateQuality,
    HeartRateReading, MotionType, SkinTemperatureReading,
};
use band_sensor_dump::report::{read_report, ReportWriter};
use band_sensor_dump::{
    Recorder, RecorderState, SensorKind, SensorReading, SessionError, SimulatedBandManager,
    SimulationConfig, Ticks, Timeouts,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

fn timeouts() -> Timeouts {
    Timeouts {
        connect: Duration::from_secs(2),
        stream: Duration::from_secs(2),
    }
}

fn manual_band(config: SimulationConfig) -> (Arc<SimulatedBandManager>, Recorder) {
    let manager = Arc::new(SimulatedBandManager::new(SimulationConfig {
        sample_interval_ms: 0,
        ..config
    }));
    let recorder = Recorder::new(manager.clone(), timeouts());
    (manager, recorder)
}

fn reading(kind: SensorKind, i: i64) -> SensorReading {
    let timestamp = Ticks(638_448_480_000_000_000 + i * 1_234);
    let v = i as f64 / 8.0;
    match kind {
        SensorKind::Accelerometer => SensorReading::Accelerometer(AccelerometerReading {
            acceleration_x: v,
            acceleration_y: -v,
            acceleration_z: 1.0,
            timestamp,
        }),
        SensorKind::Calories => SensorReading::Calories(CaloriesReading {
            calories: i,
            timestamp,
        }),
        SensorKind::Distance => SensorReading::Distance(DistanceReading {
            current_motion: MotionType::Jogging,
            total_distance: v * 100.0,
            speed: 300.0,
            pace: 3333.0,
            timestamp,
        }),
        SensorKind::Gyroscope => SensorReading::Gyroscope(GyroscopeReading {
            angular_velocity_x: v,
            angular_velocity_y: 0.0,
            angular_velocity_z: -v,
            timestamp,
        }),
        SensorKind::HeartRate => SensorReading::HeartRate(HeartRateReading {
            heart_rate: 90 + i as i32,
            quality: HeartRateQuality::Locked,
            timestamp,
        }),
        SensorKind::SkinTemperature => SensorReading::SkinTemperature(SkinTemperatureReading {
            temperature: 30.0 + v,
            timestamp,
        }),
    }
}

#[tokio::test]
async fn test_every_delivered_reading_is_recorded() {
    let (manager, mut recorder) = manual_band(SimulationConfig::default());
    recorder.discover().await.unwrap();
    recorder.start().await.unwrap();
    let band = manager.last_connected().unwrap();

    let per_kind = [17, 3, 0, 25, 8, 1];
    for (kind, count) in SensorKind::ALL.iter().zip(per_kind) {
        for i in 0..count {
            assert!(band.emit(reading(*kind, i)));
        }
    }

    let completed = recorder.stop().await.unwrap();
    for (kind, count) in SensorKind::ALL.iter().zip(per_kind) {
        assert_eq!(completed.recording.len(*kind), count as usize, "{kind}");
        assert_eq!(band.delivered(*kind), count as u64, "{kind}");
        assert_eq!(recorder.counters().count(*kind), count as u64, "{kind}");
    }

    // Readings emitted after stop are not delivered anywhere.
    assert!(!band.emit(reading(SensorKind::Calories, 99)));
}

#[tokio::test]
async fn test_generated_readings_match_delivery_counts() {
    let manager = Arc::new(SimulatedBandManager::new(SimulationConfig {
        sample_interval_ms: 5,
        ..SimulationConfig::default()
    }));
    let mut recorder = Recorder::new(manager.clone(), timeouts());
    recorder.discover().await.unwrap();
    recorder.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let completed = recorder.stop().await.unwrap();
    let band = manager.last_connected().unwrap();

    assert!(completed.recording.total() > 0);
    for kind in SensorKind::ALL {
        assert_eq!(completed.recording.len(kind) as u64, band.delivered(kind), "{kind}");
    }
}

#[tokio::test]
async fn test_starting_twice_is_rejected() {
    let (_manager, mut recorder) = manual_band(SimulationConfig::default());
    recorder.discover().await.unwrap();
    recorder.start().await.unwrap();

    let err = recorder.start().await.unwrap_err();
    assert!(err.is_precondition_violation());
    assert_eq!(recorder.state(), RecorderState::Collecting);

    recorder.stop().await.unwrap();
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_each_session_starts_with_empty_buffers() {
    let (manager, mut recorder) = manual_band(SimulationConfig::default());
    recorder.discover().await.unwrap();

    recorder.start().await.unwrap();
    let band = manager.last_connected().unwrap();
    for i in 0..5 {
        band.emit(reading(SensorKind::HeartRate, i));
    }
    let first = recorder.stop().await.unwrap();
    assert_eq!(first.recording.heart_rate.len(), 5);

    recorder.start().await.unwrap();
    let band = manager.last_connected().unwrap();
    band.emit(reading(SensorKind::HeartRate, 0));
    let second = recorder.stop().await.unwrap();
    assert_eq!(second.recording.heart_rate.len(), 1);
    assert_ne!(first.session_id, second.session_id);
}

#[tokio::test]
async fn test_failed_stream_start_leaves_recorder_idle() {
    let (manager, mut recorder) = manual_band(SimulationConfig {
        failing_sensors: vec![SensorKind::SkinTemperature],
        ..SimulationConfig::default()
    });
    recorder.discover().await.unwrap();

    let err = recorder.start().await.unwrap_err();
    match err {
        SessionError::StreamStart(e) => {
            assert_eq!(e.failed_kinds(), vec![SensorKind::SkinTemperature])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.state(), RecorderState::Idle);

    let band = manager.last_connected().unwrap();
    assert!(!band.is_connected());
    assert_eq!(band.subscriber_count(), 0);
    assert!(SensorKind::ALL.iter().all(|k| !band.is_streaming(*k)));
}

#[tokio::test]
async fn test_unreachable_band_aborts_start() {
    let (_manager, mut recorder) = manual_band(SimulationConfig {
        unreachable: true,
        ..SimulationConfig::default()
    });
    recorder.discover().await.unwrap();

    let err = recorder.start().await.unwrap_err();
    assert!(matches!(err, SessionError::Connection(_)));
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_recorded_session_round_trips_through_report() {
    let (manager, mut recorder) = manual_band(SimulationConfig::default());
    recorder.discover().await.unwrap();
    recorder.start().await.unwrap();
    let band = manager.last_connected().unwrap();
    for kind in SensorKind::ALL {
        for i in 0..4 {
            band.emit(reading(kind, i));
        }
    }
    let completed = recorder.stop().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(dir.path());
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let file = writer
        .write(Some("Running"), &completed.recording, date)
        .unwrap();
    assert_eq!(file.name, "Running-20240301.json");

    let document = read_report(&file.path).unwrap();
    assert_eq!(document.exercise, "Running");
    assert_eq!(document.accelerometer[3].timestamp, Ticks(638_448_480_000_003_702));
    assert_eq!(document.into_recording(), completed.recording);

    let second = writer.write(None, &completed.recording, date).unwrap();
    assert_eq!(second.name, "Unknown-20240301.json");
}
