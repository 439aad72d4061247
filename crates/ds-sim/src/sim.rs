//! Fixed-step runner: control update, integration, sampling.

use ds_components::ComponentError;
use ds_controls::{PIController, PIControllerState, ShiftSchedule};
use ds_core::ensure_finite;
use ds_powerflow::{Drivetrain, OperatingPoint, compile};
use ds_topology::{Topology, validate};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::dynamics::{VehicleDynamics, VehicleState};
use crate::error::{SimError, SimOutcome};
use crate::model::TransientModel;
use crate::progress::{CancelToken, SimProgress};
use crate::result::SimResult;

/// Time at standstill without enough force to move before a run is aborted (s).
pub const STALL_LIMIT_S: f64 = 5.0;

/// Output samples between `debug!` progress lines.
const LOG_EVERY: usize = 100;

/// Validate, compile and simulate a topology.
pub fn run_simulation(
    topology: &Topology,
    config: &SimConfig,
    on_progress: Option<&mut dyn FnMut(SimProgress)>,
    cancel: Option<&CancelToken>,
) -> SimOutcome<SimResult> {
    config.validate()?;
    let report = validate(topology);
    if !report.is_valid {
        let message = report
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SimError::Structural { message });
    }
    let drivetrain = compile(topology)?;
    simulate(&drivetrain, config, on_progress, cancel)
}

/// Run a compiled drivetrain from rest.
pub fn simulate(
    drivetrain: &Drivetrain,
    config: &SimConfig,
    mut on_progress: Option<&mut dyn FnMut(SimProgress)>,
    cancel: Option<&CancelToken>,
) -> SimOutcome<SimResult> {
    config.validate()?;
    let n_out = config.output_steps();
    let (n_sub, h) = config.substeps();
    let t_end = n_out as f64 * config.dt_output;
    info!(
        t_end,
        dt_output = config.dt_output,
        substeps = n_sub,
        target = config.target_velocity,
        grade = config.grade,
        "vehicle dynamics run started"
    );

    let mut model = VehicleDynamics::new(drivetrain, config.payload_fraction, config.grade);
    let pi = PIController::vehicle_speed();
    let schedule = ShiftSchedule::default();
    let floors: Vec<f64> = drivetrain
        .batteries()
        .iter()
        .filter_map(|b| drivetrain.stage(*b).battery())
        .map(|b| b.depletion_floor())
        .collect();

    let mut x = model.initial_state();
    let mut gear = 0;
    let mut pi_state = PIControllerState::default();
    let mut stalled_for = 0.0;
    let mut op = drivetrain
        .operate(0.0, gear, 0.0, &x.soc)
        .map_err(kinematics(0.0))?;

    let mut out = Recorder::new(drivetrain, n_out + 1);
    out.push(0.0, &x, gear, &op, config.grade);

    for k in 1..=n_out {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            info!(t = (k - 1) as f64 * config.dt_output, "run cancelled");
            return Err(SimError::Cancelled);
        }

        for j in 0..n_sub {
            let t = ((k - 1) as f64 + j as f64 / n_sub as f64) * config.dt_output;
            let v = x.velocity;

            let next_gear =
                schedule.select(gear, drivetrain.gear_count(), |g| drivetrain.shift_load(v, g));
            if next_gear != gear {
                debug!(t, velocity = v, from = gear, to = next_gear, "gear shift");
                gear = next_gear;
            }

            let f_max = drivetrain
                .max_force(v, gear, &x.soc)
                .map_err(kinematics(t))?;
            let f_min = drivetrain
                .min_force(v, gear, &x.soc)
                .map_err(kinematics(t))?;
            let (next_pi, command) =
                pi.update_within(&pi_state, v, config.target_velocity, h, f_min, f_max);
            pi_state = next_pi;
            op = drivetrain
                .operate(v, gear, command, &x.soc)
                .map_err(kinematics(t))?;
            model.hold(&op);

            x = config.integrator.step(&mut model, t, &x, h)?;
            x.velocity = x.velocity.max(0.0);
            for s in &mut x.soc {
                *s = s.clamp(0.0, 1.0);
            }

            let t_next = t + h;
            check_state(&x, t_next)?;
            for (i, (s, floor)) in x.soc.iter().zip(&floors).enumerate() {
                if *s < *floor {
                    warn!(t = t_next, battery = i, soc = *s, floor = *floor, "battery depleted");
                    return Err(SimError::ResourceExhausted {
                        t: t_next,
                        what: format!("battery {i} SOC {s:.3} below floor {floor:.3}"),
                    });
                }
            }

            if x.velocity <= 0.0 && command > 0.0 && f_max < model.resistance(0.0) {
                stalled_for += h;
                if stalled_for >= STALL_LIMIT_S {
                    warn!(t = t_next, f_max, "vehicle cannot move off");
                    return Err(SimError::ResourceExhausted {
                        t: t_next,
                        what: format!("tractive force {f_max:.0} N cannot overcome road load"),
                    });
                }
            } else {
                stalled_for = 0.0;
            }
        }

        let t = k as f64 * config.dt_output;
        out.push(t, &x, gear, &op, config.grade);
        if k % LOG_EVERY == 0 {
            debug!(t, velocity = x.velocity, gear, "samples recorded");
        }
        if let Some(cb) = on_progress.as_deref_mut() {
            cb(SimProgress {
                sim_time_s: t,
                t_end_s: t_end,
                fraction_complete: k as f64 / n_out as f64,
                step: k,
            });
        }
    }

    let result = out.finish();
    info!(
        samples = result.len(),
        final_velocity = result.final_velocity(),
        "vehicle dynamics run completed"
    );
    Ok(result)
}

/// A failed drivetrain solve at time `t` is a numerical failure.
fn kinematics(t: f64) -> impl Fn(ComponentError) -> SimError {
    move |e| SimError::Numerical {
        t,
        source: e.into(),
    }
}

fn check_state(x: &VehicleState, t: f64) -> SimOutcome<()> {
    let numerical = |source| SimError::Numerical { t, source };
    ensure_finite(x.velocity, "velocity").map_err(numerical)?;
    ensure_finite(x.distance, "distance").map_err(numerical)?;
    for s in &x.soc {
        ensure_finite(*s, "soc").map_err(numerical)?;
    }
    Ok(())
}

struct Recorder {
    result: SimResult,
    /// Pack capacities for the weighted SOC.
    capacities: Vec<f64>,
}

impl Recorder {
    fn new(drivetrain: &Drivetrain, capacity: usize) -> Self {
        let capacities: Vec<f64> = drivetrain
            .batteries()
            .iter()
            .filter_map(|b| drivetrain.stage(*b).battery())
            .map(|b| b.capacity_joules())
            .collect();
        let series = || Vec::with_capacity(capacity);
        Self {
            result: SimResult {
                time: series(),
                velocity: series(),
                distance: series(),
                grade: series(),
                gear: Vec::with_capacity(capacity),
                tractive_force: series(),
                fuel_rate: drivetrain.has_engine().then(series),
                soc: (!capacities.is_empty()).then(series),
                engine_power: series(),
                motor_power: series(),
                battery_power: series(),
            },
            capacities,
        }
    }

    fn push(&mut self, t: f64, x: &VehicleState, gear: usize, op: &OperatingPoint, grade: f64) {
        let r = &mut self.result;
        r.time.push(t);
        r.velocity.push(x.velocity);
        r.distance.push(x.distance);
        r.grade.push(grade);
        r.gear.push(gear);
        r.tractive_force.push(op.wheel_force);
        if let Some(fuel) = r.fuel_rate.as_mut() {
            fuel.push(op.fuel_rate);
        }
        if let Some(soc) = r.soc.as_mut() {
            let total: f64 = self.capacities.iter().sum();
            let weighted: f64 = x.soc.iter().zip(&self.capacities).map(|(s, c)| s * c).sum();
            soc.push(if total > 0.0 { weighted / total } else { 0.0 });
        }
        r.engine_power.push(op.engine_power);
        r.motor_power.push(op.motor_power);
        r.battery_power.push(op.battery_power.iter().sum());
    }

    fn finish(self) -> SimResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_topology::{ComponentType, TopologyBuilder};

    fn diesel() -> Topology {
        TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .with_default("gearbox-1", ComponentType::Gearbox)
            .with_default("vehicle-1", ComponentType::Vehicle)
            .connect("engine-1", "shaft", "gearbox-1", "input")
            .connect("gearbox-1", "output", "vehicle-1", "wheels")
            .build()
            .unwrap()
    }

    #[test]
    fn invalid_topology_is_structural() {
        let topo = TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .build()
            .unwrap();
        let err = run_simulation(&topo, &SimConfig::default(), None, None).unwrap_err();
        assert!(matches!(err, SimError::Structural { .. }));
    }

    #[test]
    fn bad_config_blocks_run() {
        let cfg = SimConfig {
            dt_output: 0.0,
            ..SimConfig::default()
        };
        let err = run_simulation(&diesel(), &cfg, None, None).unwrap_err();
        assert!(matches!(err, SimError::Config { .. }));
    }

    #[test]
    fn pre_cancelled_run_returns_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let err = run_simulation(&diesel(), &SimConfig::default(), None, Some(&token)).unwrap_err();
        assert_eq!(err, SimError::Cancelled);
    }

    #[test]
    fn kinematics_failure_is_numerical() {
        let err = kinematics(1.5)(ComponentError::Singular {
            what: "planetary torque balance",
        });
        assert!(matches!(err, SimError::Numerical { t, .. } if t == 1.5));
        assert!(err.to_string().contains("planetary torque balance"));
    }

    #[test]
    fn samples_are_uniform() {
        let cfg = SimConfig {
            t_end: 2.0,
            dt_output: 0.5,
            ..SimConfig::default()
        };
        let r = run_simulation(&diesel(), &cfg, None, None).unwrap();
        assert_eq!(r.time, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(r.velocity.len(), 5);
        assert!(r.soc.is_none());
        assert_eq!(r.fuel_rate.as_ref().map(Vec::len), Some(5));
    }
}
