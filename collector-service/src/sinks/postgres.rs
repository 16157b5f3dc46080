use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use telemetry_client::{
    db::{collection_runs, devices, readings},
    domain::{CollectionRun, DeviceId, DeviceIdentity, InverterReading, MeterReading},
};

use super::TelemetryStore;
use crate::config::DatabaseConfig;
use crate::pipeline::PipelineError;

pub struct PgTelemetryStore {
    pool: PgPool,
}

impl PgTelemetryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a lazily connecting pool: nothing is dialed until the first
    /// storage call, so an unreachable database surfaces per operation.
    pub fn connect_lazy(cfg: &DatabaseConfig, acquire_timeout: Duration) -> anyhow::Result<Self> {
        let options = match &cfg.url {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| anyhow::anyhow!("invalid database url: {e}"))?,
            None => {
                let mut options = PgConnectOptions::new()
                    .host(&cfg.host)
                    .port(cfg.port)
                    .username(&cfg.user)
                    .database(&cfg.name);
                if !cfg.password.is_empty() {
                    options = options.password(&cfg.password);
                }
                options
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options);

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TelemetryStore for PgTelemetryStore {
    async fn resolve_device(&self, identity: &DeviceIdentity) -> Result<DeviceId, PipelineError> {
        let mut conn = self.pool.acquire().await?;

        if let Some(id) = devices::find_id_by_unique_id(&mut conn, &identity.unique_id).await? {
            return Ok(id);
        }

        if let Some(id) = devices::insert_if_absent(&mut conn, identity).await? {
            tracing::info!(
                device_id = id,
                unique_id = %identity.unique_id,
                meter_model = identity.meter_model.as_deref().unwrap_or("unknown"),
                "registered new P1 device"
            );
            return Ok(id);
        }

        // Lost the insert race to a concurrent run; its row is committed now.
        devices::find_id_by_unique_id(&mut conn, &identity.unique_id)
            .await?
            .ok_or_else(|| {
                PipelineError::StorageRejected(format!(
                    "device {} neither inserted nor found",
                    identity.unique_id
                ))
            })
    }

    async fn store_inverter_reading(&self, reading: &InverterReading) -> Result<i64, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(readings::insert_inverter_reading(&mut conn, reading).await?)
    }

    async fn store_meter_reading(
        &self,
        reading: &MeterReading,
        device_id: DeviceId,
    ) -> Result<i64, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(readings::insert_meter_reading(&mut conn, reading, device_id).await?)
    }

    async fn store_collection_run(&self, run: &CollectionRun) -> Result<i64, PipelineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(collection_runs::insert(&mut conn, run).await?)
    }
}
