//! Traction battery: SOC bookkeeping and SOC-derated power limits.

use ds_core::convert::kwh_to_joules;
use ds_topology::BatteryParams;

/// Width of the SOC band over which limits fade to zero.
pub const DERATE_BAND: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Battery {
    name: String,
    params: BatteryParams,
}

impl Battery {
    pub fn new(name: impl Into<String>, params: BatteryParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &BatteryParams {
        &self.params
    }

    pub fn capacity_joules(&self) -> f64 {
        kwh_to_joules(self.params.capacity_kwh)
    }

    /// Discharge limit (W, positive), fading to zero as SOC nears `soc_min`.
    pub fn discharge_limit(&self, soc: f64) -> f64 {
        let p = &self.params;
        if soc <= p.soc_min {
            return 0.0;
        }
        let factor = ((soc - p.soc_min) / DERATE_BAND).min(1.0);
        p.p_max_discharge * factor
    }

    /// Charge limit (W, positive), fading to zero as SOC nears `soc_max`.
    pub fn charge_limit(&self, soc: f64) -> f64 {
        let p = &self.params;
        if soc >= p.soc_max {
            return 0.0;
        }
        let factor = ((p.soc_max - soc) / DERATE_BAND).min(1.0);
        p.p_max_charge * factor
    }

    /// Clamp a bus power request (discharge positive) to the derated limits.
    pub fn clamp_power(&self, power: f64, soc: f64) -> f64 {
        power.clamp(-self.charge_limit(soc), self.discharge_limit(soc))
    }

    /// `d(soc)/dt` for a terminal power (discharge positive).
    pub fn soc_rate(&self, power: f64) -> f64 {
        -power / self.capacity_joules()
    }

    /// SOC below which a run is aborted as depleted.
    pub fn depletion_floor(&self) -> f64 {
        (self.params.soc_min - 0.05).max(0.0)
    }
}
