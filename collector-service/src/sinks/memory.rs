use std::sync::Mutex;

use async_trait::async_trait;
use telemetry_client::domain::{
    CollectionRun, Device, DeviceId, DeviceIdentity, InverterReading, MeterReading,
};
use time::OffsetDateTime;

use super::TelemetryStore;
use crate::pipeline::PipelineError;

#[derive(Default)]
struct Tables {
    devices: Vec<Device>,
    inverter_readings: Vec<InverterReading>,
    meter_readings: Vec<(DeviceId, MeterReading)>,
    runs: Vec<CollectionRun>,
}

/// In-memory store with switchable failure modes.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: bool,
    reject_run_log: bool,
}

impl MemoryStore {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn rejecting_run_log() -> Self {
        Self {
            reject_run_log: true,
            ..Self::default()
        }
    }

    pub fn devices(&self) -> Vec<Device> {
        self.tables.lock().unwrap().devices.clone()
    }

    pub fn inverter_readings(&self) -> Vec<InverterReading> {
        self.tables.lock().unwrap().inverter_readings.clone()
    }

    pub fn meter_readings(&self) -> Vec<(DeviceId, MeterReading)> {
        self.tables.lock().unwrap().meter_readings.clone()
    }

    pub fn runs(&self) -> Vec<CollectionRun> {
        self.tables.lock().unwrap().runs.clone()
    }

    fn check_available(&self) -> Result<(), PipelineError> {
        if self.unavailable {
            Err(PipelineError::StorageUnavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn resolve_device(&self, identity: &DeviceIdentity) -> Result<DeviceId, PipelineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(d) = tables.devices.iter().find(|d| d.unique_id == identity.unique_id) {
            return Ok(d.id);
        }
        let id = tables.devices.len() as DeviceId + 1;
        tables.devices.push(Device {
            id,
            unique_id: identity.unique_id.clone(),
            meter_model: identity.meter_model.clone(),
            smr_version: identity.smr_version.clone(),
            wifi_ssid: identity.wifi_ssid.clone(),
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(id)
    }

    async fn store_inverter_reading(&self, reading: &InverterReading) -> Result<i64, PipelineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        tables.inverter_readings.push(reading.clone());
        Ok(tables.inverter_readings.len() as i64)
    }

    async fn store_meter_reading(
        &self,
        reading: &MeterReading,
        device_id: DeviceId,
    ) -> Result<i64, PipelineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.devices.iter().any(|d| d.id == device_id) {
            return Err(PipelineError::StorageRejected(format!(
                "device {device_id} violates foreign key"
            )));
        }
        tables.meter_readings.push((device_id, reading.clone()));
        Ok(tables.meter_readings.len() as i64)
    }

    async fn store_collection_run(&self, run: &CollectionRun) -> Result<i64, PipelineError> {
        self.check_available()?;
        if self.reject_run_log {
            return Err(PipelineError::StorageRejected("collection_logs is read-only".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        tables.runs.push(run.clone());
        Ok(tables.runs.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(model: &str) -> DeviceIdentity {
        DeviceIdentity {
            unique_id: "4530303433".to_string(),
            meter_model: Some(model.to_string()),
            smr_version: Some("50".to_string()),
            wifi_ssid: None,
        }
    }

    #[tokio::test]
    async fn resolving_twice_returns_the_same_device() {
        let store = MemoryStore::default();

        let first = store.resolve_device(&identity("ISKRA")).await.unwrap();
        let second = store.resolve_device(&identity("Landis+Gyr")).await.unwrap();

        assert_eq!(first, second);
        let devices = store.devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].meter_model.as_deref(), Some("ISKRA"));
    }
}
