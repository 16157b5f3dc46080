use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::domain::{DeviceId, InverterReading, MeterReading};

/// Insert one inverter snapshot and return the new row id.
pub async fn insert_inverter_reading(
    conn: &mut PgConnection,
    reading: &InverterReading,
) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO inverter_data (\
         ts, state, vac_l1, vac_l2, vac_l3, iac_l1, iac_l2, iac_l3, \
         freq1, freq2, freq3, pac1, pac2, pac3, p_ac, temp, e_today, t_today, \
         e_total, co2, t_total, v_pv1, v_pv2, v_pv3, v_bus, max_power, \
         i_pv11, i_pv12, i_pv13, i_pv14, i_pv21, i_pv22, i_pv23, i_pv24, \
         i_pv31, i_pv32, i_pv33, i_pv34) ",
    );

    builder.push_values(std::iter::once(reading), |mut b, r| {
        b.push_bind(r.ts)
            .push_bind(&r.state)
            .push_bind(r.vac_l1)
            .push_bind(r.vac_l2)
            .push_bind(r.vac_l3)
            .push_bind(r.iac_l1)
            .push_bind(r.iac_l2)
            .push_bind(r.iac_l3)
            .push_bind(r.freq1)
            .push_bind(r.freq2)
            .push_bind(r.freq3)
            .push_bind(r.pac1)
            .push_bind(r.pac2)
            .push_bind(r.pac3)
            .push_bind(r.p_ac)
            .push_bind(r.temp)
            .push_bind(r.e_today)
            .push_bind(r.t_today)
            .push_bind(r.e_total)
            .push_bind(r.co2)
            .push_bind(r.t_total)
            .push_bind(r.v_pv1)
            .push_bind(r.v_pv2)
            .push_bind(r.v_pv3)
            .push_bind(r.v_bus)
            .push_bind(r.max_power);
        for current in r.string_currents() {
            b.push_bind(current);
        }
    });
    builder.push(" RETURNING id");

    let id = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(id)
}

/// Insert one P1 snapshot for an already registered device and return the new
/// row id.
pub async fn insert_meter_reading(
    conn: &mut PgConnection,
    reading: &MeterReading,
    device_id: DeviceId,
) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO p1_meter_data (\
         device_id, ts, wifi_strength, active_tariff, \
         total_power_import_kwh, total_power_import_t1_kwh, total_power_import_t2_kwh, \
         total_power_export_kwh, total_power_export_t1_kwh, total_power_export_t2_kwh, \
         active_power_w, active_power_l1_w, active_power_l2_w, active_power_l3_w, \
         active_voltage_l1_v, active_voltage_l2_v, active_voltage_l3_v, \
         active_current_a, active_current_l1_a, active_current_l2_a, active_current_l3_a, \
         voltage_sag_l1_count, voltage_sag_l2_count, voltage_sag_l3_count, \
         voltage_swell_l1_count, voltage_swell_l2_count, voltage_swell_l3_count, \
         any_power_fail_count, long_power_fail_count) ",
    );

    builder.push_values(std::iter::once(reading), |mut b, m| {
        b.push_bind(device_id)
            .push_bind(m.ts)
            .push_bind(m.wifi_strength)
            .push_bind(m.active_tariff)
            .push_bind(m.total_power_import_kwh)
            .push_bind(m.total_power_import_t1_kwh)
            .push_bind(m.total_power_import_t2_kwh)
            .push_bind(m.total_power_export_kwh)
            .push_bind(m.total_power_export_t1_kwh)
            .push_bind(m.total_power_export_t2_kwh)
            .push_bind(m.active_power_w)
            .push_bind(m.active_power_l1_w)
            .push_bind(m.active_power_l2_w)
            .push_bind(m.active_power_l3_w)
            .push_bind(m.active_voltage_l1_v)
            .push_bind(m.active_voltage_l2_v)
            .push_bind(m.active_voltage_l3_v)
            .push_bind(m.active_current_a)
            .push_bind(m.active_current_l1_a)
            .push_bind(m.active_current_l2_a)
            .push_bind(m.active_current_l3_a)
            .push_bind(m.voltage_sag_l1_count)
            .push_bind(m.voltage_sag_l2_count)
            .push_bind(m.voltage_sag_l3_count)
            .push_bind(m.voltage_swell_l1_count)
            .push_bind(m.voltage_swell_l2_count)
            .push_bind(m.voltage_swell_l3_count)
            .push_bind(m.any_power_fail_count)
            .push_bind(m.long_power_fail_count);
    });
    builder.push(" RETURNING id");

    let id = builder.build_query_scalar::<i64>().fetch_one(conn).await?;
    Ok(id)
}
