//! Curve generation from a compiled drivetrain.

use ds_core::convert::{kmh_to_mps, rad_s_to_rpm};
use ds_components::Vehicle;
use ds_powerflow::{DrivePath, Drivetrain, Mover, PathRole, SATURATING_FORCE, compile};
use ds_topology::{Topology, validate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::curve::{OperatingCurve, OperatingSample, RimpullCurve, RimpullPoint};

pub const ENGINE_POINTS: usize = 51;
pub const MOTOR_POINTS: usize = 50;
pub const SPLIT_POINTS: usize = 200;
pub const RESISTANCE_POINTS: usize = 31;

/// Upper end of the power-split grid and floor of the resistance domain (km/h).
pub const SPLIT_TOP_SPEED_KMH: f64 = 60.0;

/// Grades (rise over run) of the resistance curves.
pub const RESISTANCE_GRADES: [f64; 4] = [0.0, 0.05, 0.10, 0.15];

// Top motor sample sits just inside rpmMax; the envelope is zero beyond it.
const MOTOR_EDGE: f64 = 1.0 - 1e-9;

/// Traction, resistance and operating curves for one topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RimpullReport {
    pub curves: Vec<RimpullCurve>,
    pub operating: Vec<OperatingCurve>,
}

/// Traction and resistance curves; empty for an invalid topology.
pub fn compute_rimpull(topology: &Topology) -> Vec<RimpullCurve> {
    drivetrain_of(topology)
        .map(|dt| rimpull_curves(&dt))
        .unwrap_or_default()
}

/// Operating curves of the carrier path, else the first direct path.
pub fn compute_operating_curves(topology: &Topology) -> Vec<OperatingCurve> {
    drivetrain_of(topology)
        .map(|dt| operating_curves(&dt))
        .unwrap_or_default()
}

/// Both curve sets from a single compile.
pub fn rimpull_report(topology: &Topology) -> RimpullReport {
    match drivetrain_of(topology) {
        Some(dt) => RimpullReport {
            curves: rimpull_curves(&dt),
            operating: operating_curves(&dt),
        },
        None => RimpullReport::default(),
    }
}

fn drivetrain_of(topology: &Topology) -> Option<Drivetrain> {
    let report = validate(topology);
    if !report.is_valid {
        debug!(errors = report.errors.len(), "rimpull skipped: invalid topology");
        return None;
    }
    match compile(topology) {
        Ok(dt) => Some(dt),
        Err(e) => {
            debug!(error = %e, "rimpull skipped: drivetrain does not compile");
            None
        }
    }
}

/// Traction curves followed by resistance curves.
///
/// With a power-split group every mover feeds the same ring shaft, so the
/// drivetrain gets one combined curve per gear instead of one per path.
pub fn rimpull_curves(dt: &Drivetrain) -> Vec<RimpullCurve> {
    let mut curves = if dt.split().is_some() {
        split_curves(dt)
    } else {
        dt.paths()
            .iter()
            .filter(|p| p.role == PathRole::Direct)
            .flat_map(|p| path_curves(dt, p))
            .collect()
    };

    let top = curves
        .iter()
        .map(RimpullCurve::max_velocity)
        .fold(kmh_to_mps(SPLIT_TOP_SPEED_KMH), f64::max);
    let traction = curves.len();
    curves.extend(resistance_curves(dt.vehicle(), top));
    info!(traction, resistance = RESISTANCE_GRADES.len(), top_speed = top, "rimpull computed");
    curves
}

/// Number of selectable gears seen by a path.
fn gears_on(dt: &Drivetrain, path: &DrivePath) -> usize {
    match dt.shift_gearbox() {
        Some(s) if path.passes_through(s) => dt.gear_count(),
        _ => 1,
    }
}

fn gear_label(dt: &Drivetrain, prefix: &str, gear: usize, gears: usize) -> String {
    if gears <= 1 {
        return prefix.to_string();
    }
    let ratio = dt
        .shift_gearbox()
        .and_then(|s| dt.stage(s).gearbox())
        .map_or(1.0, |g| g.stage(gear).reduction);
    format!("{prefix} Gear {} ({ratio:.2}:1)", gear + 1)
}

/// (velocity, mover speed) samples for a direct path in `gear`.
fn path_grid(dt: &Drivetrain, path: &DrivePath, mover: Mover<'_>, gear: usize) -> Vec<(f64, f64)> {
    let reduction = dt.chain(&path.hops, gear).reduction;
    let sample = |omega: f64| (dt.vehicle().velocity(omega / reduction), omega);
    match mover {
        Mover::Engine(e) => {
            let (lo, hi) = (e.idle_speed(), e.max_speed());
            (0..ENGINE_POINTS)
                .map(|i| sample(lo + (hi - lo) * i as f64 / (ENGINE_POINTS - 1) as f64))
                .collect()
        }
        Mover::Motor(m) => {
            let hi = m.max_speed() * MOTOR_EDGE;
            (1..=MOTOR_POINTS)
                .map(|i| sample(hi * i as f64 / MOTOR_POINTS as f64))
                .collect()
        }
    }
}

fn path_curves(dt: &Drivetrain, path: &DrivePath) -> Vec<RimpullCurve> {
    let Some(mover) = dt.mover(path) else {
        return Vec::new();
    };
    let name = &dt.stage(path.mover).name;
    let gears = gears_on(dt, path);
    let r = dt.vehicle().wheel_radius();

    (0..gears)
        .into_par_iter()
        .map(|gear| {
            let chain = dt.chain(&path.hops, gear);
            let points = path_grid(dt, path, mover, gear)
                .into_iter()
                .map(|(velocity, omega)| {
                    let w_wheel = dt.vehicle().wheel_speed(velocity);
                    let torque = if dt.overspeed(&path.hops, gear, w_wheel) {
                        0.0
                    } else {
                        mover.max_torque(omega)
                    };
                    RimpullPoint {
                        velocity,
                        force: chain.output_torque(torque) / r,
                    }
                })
                .collect();
            RimpullCurve::traction(gear_label(dt, name, gear, gears), Some(gear), points)
        })
        .collect()
}

fn split_grid() -> Vec<f64> {
    let top = kmh_to_mps(SPLIT_TOP_SPEED_KMH);
    (1..=SPLIT_POINTS)
        .map(|i| top * i as f64 / SPLIT_POINTS as f64)
        .collect()
}

/// Combined power-split capability per gear at the initial SOC.
fn split_curves(dt: &Drivetrain) -> Vec<RimpullCurve> {
    let soc = dt.initial_soc();
    let gears = dt.gear_count();
    let grid = split_grid();

    (0..gears)
        .into_par_iter()
        .map(|gear| {
            let points = grid
                .iter()
                .map(|&velocity| RimpullPoint {
                    velocity,
                    force: dt
                        .max_force(velocity, gear, &soc)
                        .map_or(0.0, |f| f.max(0.0)),
                })
                .collect();
            RimpullCurve::traction(gear_label(dt, "Power split", gear, gears), Some(gear), points)
        })
        .collect()
}

/// Rolling plus grade resistance of the fully loaded vehicle; no aero.
pub fn resistance_curves(vehicle: &Vehicle, top_speed: f64) -> Vec<RimpullCurve> {
    let mass = vehicle.gross_mass();
    RESISTANCE_GRADES
        .iter()
        .map(|&grade| {
            let force = vehicle.grade_resistance(mass, grade);
            let points = (0..RESISTANCE_POINTS)
                .map(|i| RimpullPoint {
                    velocity: top_speed * i as f64 / (RESISTANCE_POINTS - 1) as f64,
                    force,
                })
                .collect();
            let pct = (grade * 100.0).round();
            let name = if grade == 0.0 {
                format!("Rolling resistance ({pct}% grade)")
            } else {
                format!("Resistance ({pct}% grade)")
            };
            RimpullCurve::resistance(name, points)
        })
        .collect()
}

/// Full-load samples of the carrier mover (else the first direct one), one
/// curve per gear.
pub fn operating_curves(dt: &Drivetrain) -> Vec<OperatingCurve> {
    let carrier = dt.split().map(|s| s.carrier_path);
    let Some(index) =
        carrier.or_else(|| dt.paths().iter().position(|p| p.role == PathRole::Direct))
    else {
        return Vec::new();
    };
    let path = &dt.paths()[index];
    let Some(mover) = dt.mover(path) else {
        return Vec::new();
    };
    let name = &dt.stage(path.mover).name;
    let soc = dt.initial_soc();
    let gears = gears_on(dt, path);

    (0..gears)
        .into_par_iter()
        .map(|gear| {
            let velocities: Vec<f64> = match path.role {
                PathRole::Carrier => split_grid(),
                _ => path_grid(dt, path, mover, gear)
                    .into_iter()
                    .map(|(v, _)| v)
                    .collect(),
            };
            let points = velocities
                .into_iter()
                .map(|velocity| {
                    let state = dt
                        .operate(velocity, gear, SATURATING_FORCE, &soc)
                        .map(|op| op.movers[index])
                        .unwrap_or_default();
                    OperatingSample {
                        velocity,
                        rpm: rad_s_to_rpm(state.speed),
                        torque: state.torque,
                        power: state.power(),
                    }
                })
                .collect();
            OperatingCurve {
                name: format!("{name} Gear {}", gear + 1),
                component: name.clone(),
                gear,
                points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_topology::TopologyBuilder;
    use ds_topology::ComponentType;

    #[test]
    fn resistance_names_and_domain() {
        let v = Vehicle::new("vehicle-1", Default::default());
        let curves = resistance_curves(&v, 20.0);
        assert_eq!(curves.len(), 4);
        assert_eq!(curves[0].name, "Rolling resistance (0% grade)");
        assert_eq!(curves[2].name, "Resistance (10% grade)");
        assert_eq!(curves[0].points.len(), RESISTANCE_POINTS);
        assert_eq!(curves[0].points[0].velocity, 0.0);
        assert!((curves[0].max_velocity() - 20.0).abs() < 1e-12);
        assert!(curves[3].points[0].force > curves[1].points[0].force);
    }

    #[test]
    fn motor_top_sample_is_not_zero() {
        let topo = TopologyBuilder::new()
            .with_default("motor-1", ComponentType::Motor)
            .with_default("battery-1", ComponentType::Battery)
            .with_default("vehicle-1", ComponentType::Vehicle)
            .connect("motor-1", "shaft", "vehicle-1", "wheels")
            .connect("motor-1", "electrical", "battery-1", "electrical")
            .build()
            .unwrap();
        let curves = compute_rimpull(&topo);
        let motor = &curves[0];
        assert_eq!(motor.name, "motor-1");
        assert_eq!(motor.points.len(), MOTOR_POINTS);
        assert!(motor.points[0].velocity > 0.0);
        assert!(motor.points.last().unwrap().force > 0.0);
    }

    #[test]
    fn invalid_topology_gives_nothing() {
        let topo = TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .build()
            .unwrap();
        assert!(compute_rimpull(&topo).is_empty());
        assert_eq!(rimpull_report(&topo), RimpullReport::default());
    }
}
