use async_trait::async_trait;
use serde_json::Value;
use telemetry_client::domain::{DeviceIdentity, MeterReading};
use time::OffsetDateTime;

use super::display_opt;
use crate::pipeline::{PipelineError, Source};
use crate::sinks::TelemetryStore;
use crate::transform::{coerce_number, coerce_optional_int, coerce_required_int, coerce_text};

/// Parse the P1 meter's `/api/v1/data` JSON object.
///
/// `unique_id` is mandatory. Measurements the meter leaves out stay absent,
/// while the sag/swell and power-fail counters read as zero when missing.
pub fn parse_meter(payload: &[u8]) -> Result<MeterReading, PipelineError> {
    let doc: Value = serde_json::from_slice(payload)
        .map_err(|e| PipelineError::MalformedPayload(format!("invalid P1 JSON: {e}")))?;
    let obj = doc
        .as_object()
        .ok_or_else(|| PipelineError::MalformedPayload("P1 payload is not a JSON object".to_string()))?;

    let unique_id = coerce_text(obj.get("unique_id")).ok_or(PipelineError::MissingIdentity)?;

    let num = |key: &str| coerce_number(obj.get(key));
    let counter = |key: &str| coerce_required_int(obj.get(key), 0);

    Ok(MeterReading {
        ts: OffsetDateTime::now_utc(),
        device: DeviceIdentity {
            unique_id,
            meter_model: coerce_text(obj.get("meter_model")),
            smr_version: coerce_text(obj.get("smr_version")),
            wifi_ssid: coerce_text(obj.get("wifi_ssid")),
        },
        wifi_strength: coerce_optional_int(obj.get("wifi_strength")),
        active_tariff: coerce_optional_int(obj.get("active_tariff")),
        total_power_import_kwh: num("total_power_import_kwh"),
        total_power_import_t1_kwh: num("total_power_import_t1_kwh"),
        total_power_import_t2_kwh: num("total_power_import_t2_kwh"),
        total_power_export_kwh: num("total_power_export_kwh"),
        total_power_export_t1_kwh: num("total_power_export_t1_kwh"),
        total_power_export_t2_kwh: num("total_power_export_t2_kwh"),
        active_power_w: num("active_power_w"),
        active_power_l1_w: num("active_power_l1_w"),
        active_power_l2_w: num("active_power_l2_w"),
        active_power_l3_w: num("active_power_l3_w"),
        active_voltage_l1_v: num("active_voltage_l1_v"),
        active_voltage_l2_v: num("active_voltage_l2_v"),
        active_voltage_l3_v: num("active_voltage_l3_v"),
        active_current_a: num("active_current_a"),
        active_current_l1_a: num("active_current_l1_a"),
        active_current_l2_a: num("active_current_l2_a"),
        active_current_l3_a: num("active_current_l3_a"),
        voltage_sag_l1_count: counter("voltage_sag_l1_count"),
        voltage_sag_l2_count: counter("voltage_sag_l2_count"),
        voltage_sag_l3_count: counter("voltage_sag_l3_count"),
        voltage_swell_l1_count: counter("voltage_swell_l1_count"),
        voltage_swell_l2_count: counter("voltage_swell_l2_count"),
        voltage_swell_l3_count: counter("voltage_swell_l3_count"),
        any_power_fail_count: counter("any_power_fail_count"),
        long_power_fail_count: counter("long_power_fail_count"),
    })
}

pub struct P1Source {
    endpoint: String,
}

impl P1Source {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Source for P1Source {
    type Reading = MeterReading;

    fn label(&self) -> &'static str {
        "P1"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, payload: &[u8]) -> Result<MeterReading, PipelineError> {
        parse_meter(payload)
    }

    async fn store(&self, store: &dyn TelemetryStore, reading: &MeterReading) -> Result<(), PipelineError> {
        let device_id = store.resolve_device(&reading.device).await?;
        let id = store.store_meter_reading(reading, device_id).await?;
        tracing::debug!(row_id = id, device_id, "P1 reading stored");
        Ok(())
    }

    fn summarize(&self, r: &MeterReading) -> String {
        format!(
            "Power={}W, Tariff={}, Import={}kWh",
            display_opt(r.active_power_w),
            display_opt(r.active_tariff),
            display_opt(r.total_power_import_kwh)
        )
    }
}
