use sqlx::PgConnection;

use crate::domain::{DeviceId, DeviceIdentity};

pub async fn find_id_by_unique_id(
    conn: &mut PgConnection,
    unique_id: &str,
) -> sqlx::Result<Option<DeviceId>> {
    sqlx::query_scalar::<_, DeviceId>("SELECT id FROM p1_devices WHERE unique_id = $1")
        .bind(unique_id)
        .fetch_optional(conn)
        .await
}

/// Insert a device unless one with the same `unique_id` already exists.
///
/// Returns `None` when the unique constraint swallowed the insert, i.e. a
/// concurrent writer registered the device first.
pub async fn insert_if_absent(
    conn: &mut PgConnection,
    identity: &DeviceIdentity,
) -> sqlx::Result<Option<DeviceId>> {
    sqlx::query_scalar::<_, DeviceId>(
        r#"
        INSERT INTO p1_devices (unique_id, meter_model, smr_version, wifi_ssid)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (unique_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&identity.unique_id)
    .bind(&identity.meter_model)
    .bind(&identity.smr_version)
    .bind(&identity.wifi_ssid)
    .fetch_optional(conn)
    .await
}
