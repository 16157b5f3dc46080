pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use telemetry_client::domain::{CollectionRun, DeviceId, DeviceIdentity, InverterReading, MeterReading};

use crate::pipeline::PipelineError;

pub use postgres::PgTelemetryStore;

/// Durable storage for devices, readings and collection runs.
///
/// Every call is one self-contained operation: implementations must not hold
/// a connection across calls.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Return the device registered under `identity.unique_id`, registering it
    /// first when unknown. Attributes of an existing device are left as is.
    async fn resolve_device(&self, identity: &DeviceIdentity) -> Result<DeviceId, PipelineError>;

    async fn store_inverter_reading(&self, reading: &InverterReading) -> Result<i64, PipelineError>;

    async fn store_meter_reading(
        &self,
        reading: &MeterReading,
        device_id: DeviceId,
    ) -> Result<i64, PipelineError>;

    async fn store_collection_run(&self, run: &CollectionRun) -> Result<i64, PipelineError>;
}
