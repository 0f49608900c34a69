//! Connection to a single device.

use crate::device::{DeviceClient, DeviceInfo, DeviceManager};
use crate::error::{Operation, SessionError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// An open connection. Closing consumes the session.
pub struct DeviceSession {
    client: Arc<dyn DeviceClient>,
}

impl DeviceSession {
    /// Connect to `device`, giving up after `limit`.
    pub async fn open(
        manager: &dyn DeviceManager,
        device: &DeviceInfo,
        limit: Duration,
    ) -> Result<Self, SessionError> {
        tracing::debug!(device = %device.name, "connecting");
        let client = timeout(limit, manager.connect(device))
            .await
            .map_err(|_| SessionError::Timeout {
                operation: Operation::Connect,
                after: limit,
            })?
            .map_err(SessionError::Connection)?;

        tracing::info!(device = %device.name, "device connected");
        Ok(Self { client })
    }

    pub fn client(&self) -> &Arc<dyn DeviceClient> {
        &self.client
    }

    pub fn device(&self) -> &DeviceInfo {
        self.client.info()
    }

    /// Tear down the transport.
    pub async fn close(self, limit: Duration) -> Result<(), SessionError> {
        let name = self.device().name.clone();
        timeout(limit, self.client.disconnect())
            .await
            .map_err(|_| SessionError::Timeout {
                operation: Operation::Disconnect,
                after: limit,
            })?
            .map_err(SessionError::Connection)?;

        tracing::info!(device = %name, "device disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceError, SimulatedBandManager, SimulationConfig};

    fn config() -> SimulationConfig {
        SimulationConfig {
            sample_interval_ms: 0,
            ..SimulationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let manager = SimulatedBandManager::new(config());
        let device = manager.list_devices().await.unwrap().remove(0);

        let session = DeviceSession::open(&manager, &device, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(session.device(), &device);

        session.close(Duration::from_secs(1)).await.unwrap();
        assert!(!manager.last_connected().unwrap().is_connected());
    }

    #[tokio::test]
    async fn test_unreachable_device_is_connection_error() {
        let manager = SimulatedBandManager::new(SimulationConfig {
            unreachable: true,
            ..config()
        });
        let device = manager.list_devices().await.unwrap().remove(0);

        let result = DeviceSession::open(&manager, &device, Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(SessionError::Connection(DeviceError::Unreachable(_)))
        ));
    }

    #[tokio::test]
    async fn test_hung_connect_times_out() {
        let manager = SimulatedBandManager::new(SimulationConfig {
            response_delay_ms: 500,
            ..config()
        });
        let device = manager.list_devices().await.unwrap().remove(0);

        let result = DeviceSession::open(&manager, &device, Duration::from_millis(20)).await;
        assert!(matches!(
            result,
            Err(SessionError::Timeout {
                operation: Operation::Connect,
                ..
            })
        ));
    }
}
