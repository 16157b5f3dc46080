use time::OffsetDateTime;

use super::device::DeviceIdentity;

/// One snapshot of the P1 smart meter.
///
/// Power readings are signed: negative values mean energy is exported to the
/// grid. Event counters are never null; a counter the meter did not report is
/// stored as zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeterReading {
    pub ts: OffsetDateTime,
    pub device: DeviceIdentity,
    pub wifi_strength: Option<i64>,
    pub active_tariff: Option<i64>,
    pub total_power_import_kwh: Option<f64>,
    pub total_power_import_t1_kwh: Option<f64>,
    pub total_power_import_t2_kwh: Option<f64>,
    pub total_power_export_kwh: Option<f64>,
    pub total_power_export_t1_kwh: Option<f64>,
    pub total_power_export_t2_kwh: Option<f64>,
    pub active_power_w: Option<f64>,
    pub active_power_l1_w: Option<f64>,
    pub active_power_l2_w: Option<f64>,
    pub active_power_l3_w: Option<f64>,
    pub active_voltage_l1_v: Option<f64>,
    pub active_voltage_l2_v: Option<f64>,
    pub active_voltage_l3_v: Option<f64>,
    pub active_current_a: Option<f64>,
    pub active_current_l1_a: Option<f64>,
    pub active_current_l2_a: Option<f64>,
    pub active_current_l3_a: Option<f64>,
    pub voltage_sag_l1_count: i64,
    pub voltage_sag_l2_count: i64,
    pub voltage_sag_l3_count: i64,
    pub voltage_swell_l1_count: i64,
    pub voltage_swell_l2_count: i64,
    pub voltage_swell_l3_count: i64,
    pub any_power_fail_count: i64,
    pub long_power_fail_count: i64,
}
