//! Diesel engine: full-load torque envelope and BSFC fuel map.

use ds_core::convert::{rad_s_to_rpm, rpm_to_rad_s};
use ds_core::interp_clamped;
use ds_topology::EngineParams;

/// Overspeed band above `rpm_max` over which torque tapers to zero.
pub const OVERSPEED_TAPER_RPM: f64 = 200.0;

/// BSFC clamp range (kg/J), roughly 180 to 300 g/kWh.
pub const BSFC_MIN: f64 = 50e-9;
pub const BSFC_MAX: f64 = 83e-9;

#[derive(Debug, Clone)]
pub struct Engine {
    name: String,
    params: EngineParams,
    curve_rpm: Vec<f64>,
    curve_torque: Vec<f64>,
}

impl Engine {
    pub fn new(name: impl Into<String>, params: EngineParams) -> Self {
        let (curve_rpm, curve_torque) = params
            .torque_curve
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|p| (p[0], p[1]))
            .unzip();
        Self {
            name: name.into(),
            params,
            curve_rpm,
            curve_torque,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn idle_speed(&self) -> f64 {
        rpm_to_rad_s(self.params.rpm_idle)
    }

    pub fn max_speed(&self) -> f64 {
        rpm_to_rad_s(self.params.rpm_max)
    }

    /// End of the constant-torque region, `p_rated / t_peak` (rad/s).
    pub fn base_speed(&self) -> f64 {
        self.params.p_rated / self.params.t_peak
    }

    /// Full-load torque at an engine speed in rpm.
    ///
    /// Zero below idle (the engine cannot run there). Above `rpm_max` the
    /// value at `rpm_max` tapers linearly to zero over 200 rpm.
    pub fn max_torque_rpm(&self, rpm: f64) -> f64 {
        if rpm < self.params.rpm_idle {
            return 0.0;
        }
        if rpm <= self.params.rpm_max {
            return self.envelope(rpm);
        }
        let taper = (1.0 - (rpm - self.params.rpm_max) / OVERSPEED_TAPER_RPM).max(0.0);
        self.envelope(self.params.rpm_max) * taper
    }

    /// Full-load torque at an engine speed in rad/s.
    pub fn max_torque(&self, omega: f64) -> f64 {
        self.max_torque_rpm(rad_s_to_rpm(omega))
    }

    pub fn max_power(&self, omega: f64) -> f64 {
        self.max_torque(omega) * omega
    }

    fn envelope(&self, rpm: f64) -> f64 {
        if !self.curve_rpm.is_empty() {
            return interp_clamped(rpm, &self.curve_rpm, &self.curve_torque);
        }
        let omega = rpm_to_rad_s(rpm);
        if omega <= self.base_speed() {
            self.params.t_peak
        } else {
            self.params.p_rated / omega
        }
    }

    /// Fraction of full-load torque, clamped to [0, 1].
    pub fn load_fraction(&self, rpm: f64, torque: f64) -> f64 {
        let t_max = self.max_torque_rpm(rpm);
        if t_max <= 0.0 {
            return 0.0;
        }
        (torque / t_max).clamp(0.0, 1.0)
    }

    /// Brake-specific fuel consumption (kg/J) at an operating point.
    pub fn bsfc(&self, rpm: f64, torque: f64) -> f64 {
        let bp = &self.params.bsfc;
        let load = self.load_fraction(rpm, torque);

        let low_load = if load < bp.load_optimal {
            let ratio = if bp.load_optimal > 0.0 {
                load / bp.load_optimal
            } else {
                0.0
            };
            bp.k_low_load * (1.0 - ratio).powi(2)
        } else {
            0.0
        };
        let high_load = if load > bp.load_optimal {
            bp.k_high_load * (load - bp.load_optimal).powi(2)
        } else {
            0.0
        };
        let speed = bp.k_speed * (rpm - bp.rpm_optimal).powi(2);

        (bp.bsfc_optimal * (1.0 + low_load + high_load + speed)).clamp(BSFC_MIN, BSFC_MAX)
    }

    /// Fuel mass flow (kg/s). Zero when the engine is not delivering power.
    pub fn fuel_rate(&self, torque: f64, omega: f64) -> f64 {
        if torque <= 0.0 || omega <= 0.0 {
            return 0.0;
        }
        torque * omega * self.bsfc(rad_s_to_rpm(omega), torque)
    }

    /// Speed at which the engine produces the most power (rad/s).
    pub fn rated_speed(&self) -> f64 {
        if self.curve_rpm.is_empty() {
            return self.base_speed().clamp(self.idle_speed(), self.max_speed());
        }
        self.scan()
            .fold((self.idle_speed(), 0.0), |best, w| {
                let p = self.max_power(w);
                if p > best.1 { (w, p) } else { best }
            })
            .0
    }

    /// Lowest speed in `[idle, rated]` whose full-load power reaches
    /// `power`; the rated speed when none does.
    pub fn speed_for_power(&self, power: f64) -> f64 {
        let idle = self.idle_speed();
        let rated = self.rated_speed();
        if power <= 0.0 {
            return idle;
        }
        if self.curve_rpm.is_empty() {
            return (power / self.params.t_peak).clamp(idle, rated);
        }
        self.scan()
            .take_while(|w| *w <= rated)
            .find(|w| self.max_power(*w) >= power)
            .unwrap_or(rated)
    }

    /// 10 rpm grid from idle to max speed.
    fn scan(&self) -> impl Iterator<Item = f64> + '_ {
        let lo = self.params.rpm_idle;
        let n = ((self.params.rpm_max - lo) / 10.0).floor().max(0.0) as usize;
        (0..=n).map(move |i| rpm_to_rad_s(lo + 10.0 * i as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat() -> Engine {
        Engine::new("engine-1", EngineParams::default())
    }

    #[test]
    fn constant_torque_then_constant_power() {
        let e = cat();
        assert!((e.base_speed() - 1_801_000.0 / 11_220.0).abs() < 1e-9);
        assert_eq!(e.max_torque_rpm(1000.0), 11_220.0);
        let w = rpm_to_rad_s(1700.0);
        assert!((e.max_torque(w) - 1_801_000.0 / w).abs() < 1e-6);
        assert_eq!(e.max_torque_rpm(600.0), 0.0);
    }

    #[test]
    fn overspeed_tapers_to_zero() {
        let e = cat();
        let at_max = e.max_torque_rpm(1800.0);
        assert!((e.max_torque_rpm(1900.0) - 0.5 * at_max).abs() < 1e-6);
        assert_eq!(e.max_torque_rpm(2000.0), 0.0);
        assert_eq!(e.max_torque_rpm(2500.0), 0.0);
    }

    #[test]
    fn curve_overrides_default_envelope() {
        let params = EngineParams {
            torque_curve: Some(vec![[700.0, 9_500.0], [1200.0, 11_220.0], [1800.0, 9_800.0]]),
            ..EngineParams::default()
        };
        let e = Engine::new("engine-1", params);
        assert!((e.max_torque_rpm(950.0) - 10_360.0).abs() < 1e-6);
        // Power peaks at the top of the curve for this shape.
        let rated_rpm = rad_s_to_rpm(e.rated_speed());
        assert!((rated_rpm - 1800.0).abs() < 10.0 + 1e-9);
    }

    #[test]
    fn bsfc_best_at_optimum_and_clamped() {
        let e = cat();
        let t_opt = 0.7 * e.max_torque_rpm(1300.0);
        assert!((e.bsfc(1300.0, t_opt) - 54.2e-9).abs() < 1e-15);
        assert!(e.bsfc(1300.0, 0.1 * t_opt) > e.bsfc(1300.0, t_opt));
        assert!(e.bsfc(1800.0, t_opt) > e.bsfc(1300.0, t_opt));
        // Idle, no load: 54.2e-9 * (1 + 0.35 + 0.18), just under the ceiling.
        assert!((e.bsfc(700.0, 0.0) - 82.926e-9).abs() < 1e-15);
        assert_eq!(e.bsfc(2000.0, 0.0), BSFC_MAX);
    }

    #[test]
    fn fuel_rate_zero_without_positive_power() {
        let e = cat();
        assert_eq!(e.fuel_rate(0.0, 150.0), 0.0);
        assert_eq!(e.fuel_rate(-1000.0, 150.0), 0.0);
        assert_eq!(e.fuel_rate(1000.0, 0.0), 0.0);
        let w = rpm_to_rad_s(1300.0);
        let t = 0.7 * e.max_torque(w);
        assert!((e.fuel_rate(t, w) - t * w * 54.2e-9).abs() < 1e-9);
    }

    #[test]
    fn speed_for_power_is_lowest_full_load_speed() {
        let e = cat();
        assert_eq!(e.speed_for_power(0.0), e.idle_speed());
        let w = e.speed_for_power(1_000_000.0);
        assert!((w - 1_000_000.0 / 11_220.0).abs() < 1e-9);
        // Beyond rated power the engine sits at its rated speed.
        assert!((e.speed_for_power(5e6) - e.base_speed()).abs() < 1e-9);
    }
}
