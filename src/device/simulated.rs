//! Simulated wearable used when no vendor transport is linked in.
//!
//! A [`SimulatedBand`] behaves like a real device from the recorder's point
//! of view: streams must be started before they produce readings, readings
//! are delivered to subscribers from a background thread, and configured
//! sensors can be made to fail. Tests drive it directly through
//! [`SimulatedBand::emit`].

use crate::core::Ticks;
use crate::device::types::{
    AccelerometerReading, CaloriesReading, DeviceInfo, DistanceReading, GyroscopeReading,
    HeartRateQuality, HeartRateReading, MotionType, SensorKind, SensorReading,
    SkinTemperatureReading,
};
use crate::device::{DeviceClient, DeviceError, DeviceManager, ReadingSink, SubscriptionToken};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// How the simulated device presents itself and misbehaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub device_name: String,
    /// Number of devices reported by discovery
    pub device_count: usize,
    /// Interval between generated samples; 0 disables the generator
    pub sample_interval_ms: u64,
    /// Streams that refuse to start
    pub failing_sensors: Vec<SensorKind>,
    /// Artificial latency of connect and stream start/stop
    pub response_delay_ms: u64,
    /// Whether connect fails outright
    pub unreachable: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_name: "Simulated Band".to_string(),
            device_count: 1,
            sample_interval_ms: 100,
            failing_sensors: Vec::new(),
            response_delay_ms: 0,
            unreachable: false,
        }
    }
}

/// Discovery and connection for simulated bands.
pub struct SimulatedBandManager {
    config: SimulationConfig,
    last_connected: Mutex<Option<Arc<SimulatedBand>>>,
}

impl SimulatedBandManager {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            last_connected: Mutex::new(None),
        }
    }

    /// The band handed out by the most recent successful `connect`.
    pub fn last_connected(&self) -> Option<Arc<SimulatedBand>> {
        lock(&self.last_connected).clone()
    }

    async fn respond(&self) {
        if self.config.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.response_delay_ms)).await;
        }
    }
}

#[async_trait]
impl DeviceManager for SimulatedBandManager {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        let devices = (0..self.config.device_count)
            .map(|i| {
                let name = if i == 0 {
                    self.config.device_name.clone()
                } else {
                    format!("{} {}", self.config.device_name, i + 1)
                };
                DeviceInfo::new(name, format!("00:00:5E:00:53:{:02X}", i))
            })
            .collect();
        Ok(devices)
    }

    async fn connect(&self, device: &DeviceInfo) -> Result<Arc<dyn DeviceClient>, DeviceError> {
        self.respond().await;
        if self.config.unreachable {
            return Err(DeviceError::Unreachable(device.name.clone()));
        }

        let band = Arc::new(SimulatedBand::new(device.clone(), self.config.clone()));
        band.spawn_generator();
        *lock(&self.last_connected) = Some(band.clone());
        Ok(band)
    }
}

struct Subscriber {
    kind: SensorKind,
    id: u64,
    sink: ReadingSink,
}

struct BandState {
    connected: AtomicBool,
    streaming: [AtomicBool; 6],
    delivered: [AtomicU64; 6],
    subscribers: Mutex<Vec<Subscriber>>,
    next_subscription: AtomicU64,
}

/// A connected simulated band.
pub struct SimulatedBand {
    info: DeviceInfo,
    config: SimulationConfig,
    state: Arc<BandState>,
}

impl SimulatedBand {
    fn new(info: DeviceInfo, config: SimulationConfig) -> Self {
        Self {
            info,
            config,
            state: Arc::new(BandState {
                connected: AtomicBool::new(true),
                streaming: Default::default(),
                delivered: Default::default(),
                subscribers: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    fn spawn_generator(&self) {
        if self.config.sample_interval_ms == 0 {
            return;
        }
        let interval = Duration::from_millis(self.config.sample_interval_ms);
        let state = self.state.clone();

        thread::spawn(move || {
            let mut step: u64 = 0;
            while state.connected.load(Ordering::SeqCst) {
                thread::sleep(interval);
                for kind in SensorKind::ALL {
                    state.emit(synthetic_reading(kind, step));
                }
                step += 1;
            }
        });
    }

    /// Deliver `reading` to its stream's subscribers.
    ///
    /// Returns `false` without delivering if the stream is not started.
    pub fn emit(&self, reading: SensorReading) -> bool {
        self.state.emit(reading)
    }

    /// Readings delivered to at least one subscriber for `kind`.
    pub fn delivered(&self, kind: SensorKind) -> u64 {
        self.state.delivered[kind.index()].load(Ordering::SeqCst)
    }

    pub fn is_streaming(&self, kind: SensorKind) -> bool {
        self.state.streaming[kind.index()].load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state.subscribers).len()
    }

    async fn respond(&self) {
        if self.config.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.response_delay_ms)).await;
        }
    }
}

impl BandState {
    fn emit(&self, reading: SensorReading) -> bool {
        let kind = reading.kind();
        if !self.connected.load(Ordering::SeqCst) || !self.streaming[kind.index()].load(Ordering::SeqCst)
        {
            return false;
        }

        let subscribers = lock(&self.subscribers);
        let mut delivered = false;
        for subscriber in subscribers.iter().filter(|s| s.kind == kind) {
            delivered |= subscriber.sink.send(reading.clone()).is_ok();
        }
        if delivered {
            self.delivered[kind.index()].fetch_add(1, Ordering::SeqCst);
        }
        true
    }
}

#[async_trait]
impl DeviceClient for SimulatedBand {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn start_readings(&self, kind: SensorKind) -> Result<(), DeviceError> {
        self.respond().await;
        if !self.is_connected() {
            return Err(DeviceError::Closed);
        }
        if self.config.failing_sensors.contains(&kind) {
            return Err(DeviceError::SensorUnavailable {
                kind,
                reason: "sensor did not acknowledge start".to_string(),
            });
        }
        self.state.streaming[kind.index()].store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_readings(&self, kind: SensorKind) -> Result<(), DeviceError> {
        self.respond().await;
        if !self.is_connected() {
            return Err(DeviceError::Closed);
        }
        self.state.streaming[kind.index()].store(false, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self, kind: SensorKind, sink: ReadingSink) -> SubscriptionToken {
        let id = self.state.next_subscription.fetch_add(1, Ordering::SeqCst);
        lock(&self.state.subscribers).push(Subscriber { kind, id, sink });
        SubscriptionToken { kind, id }
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        lock(&self.state.subscribers).retain(|s| !(s.kind == token.kind && s.id == token.id));
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        if !self.state.connected.swap(false, Ordering::SeqCst) {
            return Err(DeviceError::Closed);
        }
        for streaming in &self.state.streaming {
            streaming.store(false, Ordering::SeqCst);
        }
        lock(&self.state.subscribers).clear();
        Ok(())
    }
}

/// Plausible values following a slow workout-like curve.
fn synthetic_reading(kind: SensorKind, step: u64) -> SensorReading {
    let t = step as f64 / 10.0;
    let timestamp = Ticks::now();
    match kind {
        SensorKind::Accelerometer => SensorReading::Accelerometer(AccelerometerReading {
            acceleration_x: 0.1 * t.sin(),
            acceleration_y: 0.1 * t.cos(),
            acceleration_z: 1.0 + 0.05 * (2.0 * t).sin(),
            timestamp,
        }),
        SensorKind::Calories => SensorReading::Calories(CaloriesReading {
            calories: (step / 10) as i64,
            timestamp,
        }),
        SensorKind::Distance => SensorReading::Distance(DistanceReading {
            current_motion: if step < 20 {
                MotionType::Walking
            } else {
                MotionType::Running
            },
            total_distance: step as f64 * 25.0,
            speed: 250.0,
            pace: 4000.0,
            timestamp,
        }),
        SensorKind::Gyroscope => SensorReading::Gyroscope(GyroscopeReading {
            angular_velocity_x: 5.0 * t.sin(),
            angular_velocity_y: 5.0 * t.cos(),
            angular_velocity_z: 0.5,
            timestamp,
        }),
        SensorKind::HeartRate => SensorReading::HeartRate(HeartRateReading {
            heart_rate: 70 + (step.min(80) / 2) as i32,
            quality: if step < 5 {
                HeartRateQuality::Acquiring
            } else {
                HeartRateQuality::Locked
            },
            timestamp,
        }),
        SensorKind::SkinTemperature => SensorReading::SkinTemperature(SkinTemperatureReading {
            temperature: 31.0 + 0.01 * step.min(200) as f64,
            timestamp,
        }),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
