//! Fixed and multi-ratio gear stages.
//!
//! Two conventions meet here. Gearbox parameters store *reductions*
//! `K = ω_in / ω_out` (a first gear of 4.59 slows the output). The transfer
//! function works with the *speed ratio* `r = ω_out / ω_in = 1 / K`.

use crate::common::{check_finite, flows_forward};
use crate::error::{ComponentError, ComponentResult};
use ds_topology::GearboxParams;

/// Propagate speed and torque across one gear mesh.
///
/// `speed_out = speed_in * ratio`. Torque is divided by `ratio` and the
/// efficiency is applied in the direction power flows: multiplied when the
/// input drives the output, divided when the output back-drives the input.
pub fn transfer(
    speed_in: f64,
    torque_in: f64,
    ratio: f64,
    efficiency: f64,
) -> ComponentResult<(f64, f64)> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(ComponentError::InvalidArg { what: "gear ratio" });
    }
    if !(efficiency > 0.0 && efficiency <= 1.0) {
        return Err(ComponentError::InvalidArg {
            what: "gear efficiency",
        });
    }
    let speed_out = speed_in * ratio;
    let ideal = torque_in / ratio;
    let torque_out = if flows_forward(torque_in, speed_in) {
        ideal * efficiency
    } else {
        ideal / efficiency
    };
    Ok((
        check_finite(speed_out, "gear output speed")?,
        check_finite(torque_out, "gear output torque")?,
    ))
}

/// One engaged ratio, expressed as a reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearStage {
    pub reduction: f64,
    pub efficiency: f64,
}

impl GearStage {
    pub const DIRECT: GearStage = GearStage {
        reduction: 1.0,
        efficiency: 1.0,
    };

    pub fn new(reduction: f64, efficiency: f64) -> Self {
        Self {
            reduction,
            efficiency,
        }
    }

    /// Input speed for a given output speed.
    pub fn input_speed(&self, speed_out: f64) -> f64 {
        speed_out * self.reduction
    }

    /// Drive an input shaft forward through the stage.
    pub fn forward(&self, speed_in: f64, torque_in: f64) -> ComponentResult<(f64, f64)> {
        transfer(speed_in, torque_in, 1.0 / self.reduction, self.efficiency)
    }

    /// Input torque needed to produce `torque_out` at `speed_out`.
    ///
    /// Inverse of [`GearStage::forward`]: losses are charged to the input
    /// when driving and credited against it when back-driven.
    pub fn input_torque(&self, torque_out: f64, speed_out: f64) -> f64 {
        if flows_forward(torque_out, speed_out) {
            torque_out / (self.reduction * self.efficiency)
        } else {
            torque_out * self.efficiency / self.reduction
        }
    }

    /// Output torque delivered by a driving input torque (power forward).
    pub fn output_torque(&self, torque_in: f64) -> f64 {
        torque_in * self.reduction * self.efficiency
    }

    /// Combine with a downstream stage.
    pub fn then(self, downstream: GearStage) -> GearStage {
        GearStage {
            reduction: self.reduction * downstream.reduction,
            efficiency: self.efficiency * downstream.efficiency,
        }
    }
}

/// A gearbox with one or more selectable ratios.
#[derive(Debug, Clone)]
pub struct Gearbox {
    name: String,
    params: GearboxParams,
}

impl Gearbox {
    pub fn new(name: impl Into<String>, params: GearboxParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gear_count(&self) -> usize {
        self.params.ratios.len()
    }

    pub fn is_shiftable(&self) -> bool {
        self.gear_count() > 1
    }

    /// Stage for a gear index, clamped to the available range.
    pub fn stage(&self, gear: usize) -> GearStage {
        let n = self.gear_count();
        if n == 0 {
            return GearStage::DIRECT;
        }
        let g = gear.min(n - 1);
        let eta = self.params.efficiencies.get(g).copied().unwrap_or(1.0);
        GearStage::new(self.params.ratios[g], eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_forward_applies_efficiency() {
        let (w, t) = transfer(100.0, 100.0, 2.0, 0.97).unwrap();
        assert!((w - 200.0).abs() < 1e-12);
        assert!((t - 48.5).abs() < 1e-12);
    }

    #[test]
    fn transfer_reverse_flow_divides_efficiency() {
        // Output back-drives the input: negative power at the input shaft.
        let (_, t) = transfer(100.0, -100.0, 2.0, 0.97).unwrap();
        assert!((t - (-50.0 / 0.97)).abs() < 1e-9);
    }

    #[test]
    fn transfer_rejects_bad_ratio() {
        assert!(transfer(1.0, 1.0, 0.0, 0.97).is_err());
        assert!(transfer(1.0, 1.0, 2.0, 1.2).is_err());
    }

    #[test]
    fn stage_inverse_matches_forward() {
        let st = GearStage::new(4.59, 0.97);
        let (w_out, t_out) = st.forward(150.0, 10_000.0).unwrap();
        assert!((st.input_speed(w_out) - 150.0).abs() < 1e-9);
        assert!((st.input_torque(t_out, w_out) - 10_000.0).abs() < 1e-6);
        assert!((st.output_torque(10_000.0) - t_out).abs() < 1e-6);
    }

    #[test]
    fn stages_compose() {
        let st = GearStage::new(3.0, 0.97).then(GearStage::new(10.83, 0.96));
        assert!((st.reduction - 32.49).abs() < 1e-9);
        assert!((st.efficiency - 0.9312).abs() < 1e-9);
    }

    #[test]
    fn gearbox_clamps_gear_index() {
        let gb = Gearbox::new("gearbox-1", GearboxParams::single(2.85, 0.97));
        assert!(!gb.is_shiftable());
        assert_eq!(gb.stage(5), GearStage::new(2.85, 0.97));
        let seven = Gearbox::new("gearbox-2", GearboxParams::default());
        assert_eq!(seven.gear_count(), 7);
        assert_eq!(seven.stage(0).reduction, 4.59);
        assert_eq!(seven.name(), "gearbox-2");
    }
}
