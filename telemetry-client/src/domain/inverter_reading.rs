use time::OffsetDateTime;

/// One snapshot of the solar inverter's real-time status page.
///
/// `pac1..pac3` are `None` when the phase/string is not wired on the
/// installation, which is distinct from `Some(0)` (wired, no power flowing).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InverterReading {
    pub ts: OffsetDateTime,
    pub state: Option<String>,
    pub vac_l1: Option<f64>,
    pub vac_l2: Option<f64>,
    pub vac_l3: Option<f64>,
    pub iac_l1: Option<f64>,
    pub iac_l2: Option<f64>,
    pub iac_l3: Option<f64>,
    pub freq1: Option<f64>,
    pub freq2: Option<f64>,
    pub freq3: Option<f64>,
    pub pac1: Option<i64>,
    pub pac2: Option<i64>,
    pub pac3: Option<i64>,
    pub p_ac: i64,
    pub temp: Option<f64>,
    pub e_today: Option<f64>,
    pub t_today: Option<f64>,
    pub e_total: Option<f64>,
    pub co2: Option<f64>,
    pub t_total: Option<f64>,
    pub v_pv1: Option<f64>,
    pub v_pv2: Option<f64>,
    pub v_pv3: Option<f64>,
    pub v_bus: Option<f64>,
    pub max_power: i64,
    pub i_pv11: Option<f64>,
    pub i_pv12: Option<f64>,
    pub i_pv13: Option<f64>,
    pub i_pv14: Option<f64>,
    pub i_pv21: Option<f64>,
    pub i_pv22: Option<f64>,
    pub i_pv23: Option<f64>,
    pub i_pv24: Option<f64>,
    pub i_pv31: Option<f64>,
    pub i_pv32: Option<f64>,
    pub i_pv33: Option<f64>,
    pub i_pv34: Option<f64>,
}

impl InverterReading {
    /// The twelve per-string currents in column order (`i_pv11` .. `i_pv34`).
    pub fn string_currents(&self) -> [Option<f64>; 12] {
        [
            self.i_pv11,
            self.i_pv12,
            self.i_pv13,
            self.i_pv14,
            self.i_pv21,
            self.i_pv22,
            self.i_pv23,
            self.i_pv24,
            self.i_pv31,
            self.i_pv32,
            self.i_pv33,
            self.i_pv34,
        ]
    }
}
