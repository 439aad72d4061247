//! Summary metrics of a vehicle dynamics run.

use ds_core::convert::joules_to_kwh;
use ds_sim::SimResult;
use serde::{Deserialize, Serialize};

/// Fraction of the target speed that counts as "reached".
pub const TARGET_BAND: f64 = 0.95;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// m/s
    pub final_velocity: f64,
    /// m/s
    pub max_velocity: f64,
    /// First sample at or above 95 % of the target speed (s).
    pub time_to_target_s: Option<f64>,
    /// m
    pub distance_m: f64,
    /// Trapezoidal integral of fuel rate; `None` without an engine.
    pub total_fuel_kg: Option<f64>,
    pub avg_fuel_rate_kg_h: Option<f64>,
    /// Net pack energy, discharge positive; `None` without a battery.
    pub battery_energy_kwh: Option<f64>,
    /// Sample means (W).
    pub avg_engine_power_w: f64,
    pub avg_motor_power_w: f64,
}

fn trapezoid(time: &[f64], y: &[f64]) -> f64 {
    time.windows(2)
        .zip(y.windows(2))
        .map(|(t, y)| 0.5 * (y[0] + y[1]) * (t[1] - t[0]))
        .sum()
}

fn mean(y: &[f64]) -> f64 {
    if y.is_empty() {
        0.0
    } else {
        y.iter().sum::<f64>() / y.len() as f64
    }
}

pub fn compute_run_metrics(result: &SimResult, target_velocity: f64) -> RunMetrics {
    if result.is_empty() {
        return RunMetrics::default();
    }
    let threshold = TARGET_BAND * target_velocity;
    RunMetrics {
        final_velocity: result.final_velocity(),
        max_velocity: result.velocity.iter().copied().fold(0.0, f64::max),
        time_to_target_s: result
            .time
            .iter()
            .zip(&result.velocity)
            .find(|(_, v)| **v >= threshold)
            .map(|(t, _)| *t),
        distance_m: result.distance.last().copied().unwrap_or(0.0),
        total_fuel_kg: result.fuel_rate.as_deref().map(|f| trapezoid(&result.time, f)),
        avg_fuel_rate_kg_h: result.fuel_rate.as_deref().map(|f| mean(f) * 3600.0),
        battery_energy_kwh: result
            .soc
            .as_ref()
            .map(|_| joules_to_kwh(trapezoid(&result.time, &result.battery_power))),
        avg_engine_power_w: mean(&result.engine_power),
        avg_motor_power_w: mean(&result.motor_power),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp() -> SimResult {
        SimResult {
            time: vec![0.0, 1.0, 2.0, 3.0],
            velocity: vec![0.0, 5.0, 11.5, 12.0],
            distance: vec![0.0, 2.5, 10.75, 22.5],
            grade: vec![0.0; 4],
            gear: vec![0; 4],
            tractive_force: vec![1.0; 4],
            fuel_rate: Some(vec![0.1, 0.2, 0.2, 0.1]),
            soc: Some(vec![0.6; 4]),
            engine_power: vec![0.0, 1e5, 2e5, 1e5],
            motor_power: vec![0.0; 4],
            battery_power: vec![3.6e6; 4],
        }
    }

    #[test]
    fn ramp_metrics() {
        let m = compute_run_metrics(&ramp(), 12.0);
        assert_eq!(m.final_velocity, 12.0);
        assert_eq!(m.max_velocity, 12.0);
        assert_eq!(m.time_to_target_s, Some(2.0));
        assert_eq!(m.distance_m, 22.5);
        assert!((m.total_fuel_kg.unwrap() - 0.5).abs() < 1e-12);
        assert!((m.avg_fuel_rate_kg_h.unwrap() - 540.0).abs() < 1e-9);
        // 3.6 MW for 3 s.
        assert!((m.battery_energy_kwh.unwrap() - 3.0).abs() < 1e-9);
        assert!((m.avg_engine_power_w - 1e5).abs() < 1e-9);
    }

    #[test]
    fn target_never_reached() {
        let m = compute_run_metrics(&ramp(), 20.0);
        assert_eq!(m.time_to_target_s, None);
    }

    #[test]
    fn empty_result() {
        assert_eq!(compute_run_metrics(&SimResult::default(), 12.0), RunMetrics::default());
    }

    fn cruise(velocity: Vec<f64>, battery_w: f64) -> SimResult {
        let n = velocity.len();
        SimResult {
            time: (0..n).map(|i| i as f64 * 0.5).collect(),
            distance: vec![0.0; n],
            grade: vec![0.0; n],
            gear: vec![0; n],
            tractive_force: vec![0.0; n],
            fuel_rate: None,
            soc: Some(vec![0.5; n]),
            engine_power: vec![0.0; n],
            motor_power: vec![0.0; n],
            battery_power: vec![battery_w; n],
            velocity,
        }
    }

    proptest! {
        #[test]
        fn peak_and_target_time_agree_with_samples(
            velocity in proptest::collection::vec(0.0f64..20.0, 2..40),
            target in 1.0f64..20.0,
        ) {
            let r = cruise(velocity.clone(), 0.0);
            let m = compute_run_metrics(&r, target);
            prop_assert!(velocity.iter().all(|v| *v <= m.max_velocity));
            prop_assert!(m.max_velocity >= m.final_velocity);
            match m.time_to_target_s {
                Some(t) => {
                    let k = (t / 0.5).round() as usize;
                    prop_assert!(velocity[k] >= TARGET_BAND * target);
                    prop_assert!(velocity[..k].iter().all(|v| *v < TARGET_BAND * target));
                }
                None => prop_assert!(velocity.iter().all(|v| *v < TARGET_BAND * target)),
            }
            prop_assert!(m.total_fuel_kg.is_none());
        }

        #[test]
        fn steady_battery_draw_integrates_linearly(
            n in 2usize..50,
            power in -1e6f64..1e6,
        ) {
            let m = compute_run_metrics(&cruise(vec![5.0; n], power), 12.0);
            let expected = power * (n - 1) as f64 * 0.5 / 3.6e6;
            prop_assert!((m.battery_energy_kwh.unwrap() - expected).abs() < 1e-9);
        }
    }
}
