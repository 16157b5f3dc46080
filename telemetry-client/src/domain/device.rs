use time::OffsetDateTime;

/// Internal reference of a row in `p1_devices`.
pub type DeviceId = i64;

/// Identity a P1 meter reports about itself on every reading.
///
/// `unique_id` is the natural key; the remaining attributes are only written
/// when the device is first registered.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceIdentity {
    pub unique_id: String,
    pub meter_model: Option<String>,
    pub smr_version: Option<String>,
    pub wifi_ssid: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Device {
    pub id: DeviceId,
    pub unique_id: String,
    pub meter_model: Option<String>,
    pub smr_version: Option<String>,
    pub wifi_ssid: Option<String>,
    pub created_at: OffsetDateTime,
}
