//! Electric motor/generator with a constant-torque, constant-power envelope.

use ds_core::convert::{rad_s_to_rpm, rpm_to_rad_s};
use ds_topology::MotorParams;

#[derive(Debug, Clone)]
pub struct Motor {
    name: String,
    params: MotorParams,
}

impl Motor {
    pub fn new(name: impl Into<String>, params: MotorParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &MotorParams {
        &self.params
    }

    /// End of the constant-torque region, `p_max / t_max` (rad/s).
    pub fn base_speed(&self) -> f64 {
        self.params.p_max / self.params.t_max
    }

    pub fn max_speed(&self) -> f64 {
        rpm_to_rad_s(self.params.rpm_max)
    }

    /// Power limit; the boost rating when requested and configured.
    pub fn power_limit(&self, boost: bool) -> f64 {
        match (boost, self.params.p_boost) {
            (true, Some(p)) => p,
            _ => self.params.p_max,
        }
    }

    /// Torque magnitude available at a shaft speed, either direction.
    ///
    /// Zero beyond `rpm_max`.
    pub fn max_torque(&self, omega: f64, boost: bool) -> f64 {
        let w = omega.abs();
        if rad_s_to_rpm(w) > self.params.rpm_max {
            return 0.0;
        }
        if w <= self.base_speed() || w <= 0.0 {
            return self.params.t_max;
        }
        (self.power_limit(boost) / w).min(self.params.t_max)
    }

    /// Electrical power drawn from the bus (W, discharge positive).
    ///
    /// Motoring draws `P/η`; generating returns `P·η`.
    pub fn electrical_power(&self, torque: f64, omega: f64) -> f64 {
        let p_mech = torque * omega;
        if p_mech >= 0.0 {
            p_mech / self.params.eta
        } else {
            p_mech * self.params.eta
        }
    }
}
