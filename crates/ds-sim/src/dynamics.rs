//! Longitudinal vehicle dynamics as a [`TransientModel`].

use ds_powerflow::{Drivetrain, OperatingPoint};

use crate::error::SimOutcome;
use crate::model::TransientModel;

/// Integrated state; `soc` holds one entry per battery.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// m/s
    pub velocity: f64,
    /// m
    pub distance: f64,
    pub soc: Vec<f64>,
}

/// Vehicle on a constant grade driven by a held wheel force.
///
/// The runner sets the control (wheel force and pack powers) before each
/// sub-step with [`VehicleDynamics::hold`]; the integrator only sees the
/// road load change with velocity.
pub struct VehicleDynamics<'a> {
    drivetrain: &'a Drivetrain,
    mass: f64,
    grade: f64,
    force: f64,
    battery_power: Vec<f64>,
}

impl<'a> VehicleDynamics<'a> {
    pub fn new(drivetrain: &'a Drivetrain, payload_fraction: f64, grade: f64) -> Self {
        Self {
            drivetrain,
            mass: drivetrain.vehicle().mass(payload_fraction),
            grade,
            force: 0.0,
            battery_power: vec![0.0; drivetrain.batteries().len()],
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn grade(&self) -> f64 {
        self.grade
    }

    /// Road load at `velocity` (N).
    pub fn resistance(&self, velocity: f64) -> f64 {
        self.drivetrain
            .vehicle()
            .road_load(self.mass, velocity, self.grade)
            .total()
    }

    /// Hold an operating point's wheel force and pack powers.
    pub fn hold(&mut self, op: &OperatingPoint) {
        self.force = op.wheel_force;
        self.battery_power.clone_from(&op.battery_power);
    }
}

impl TransientModel for VehicleDynamics<'_> {
    type State = VehicleState;

    fn initial_state(&self) -> VehicleState {
        VehicleState {
            velocity: 0.0,
            distance: 0.0,
            soc: self.drivetrain.initial_soc(),
        }
    }

    fn rhs(&mut self, _t: f64, x: &VehicleState) -> SimOutcome<VehicleState> {
        let v = x.velocity.max(0.0);
        let accel = (self.force - self.resistance(v)) / self.mass;
        let soc = self
            .drivetrain
            .batteries()
            .iter()
            .zip(&self.battery_power)
            .map(|(b, p)| {
                self.drivetrain
                    .stage(*b)
                    .battery()
                    .map_or(0.0, |pack| pack.soc_rate(*p))
            })
            .collect();
        Ok(VehicleState {
            velocity: accel,
            distance: v,
            soc,
        })
    }

    fn add(&self, a: &VehicleState, b: &VehicleState) -> VehicleState {
        VehicleState {
            velocity: a.velocity + b.velocity,
            distance: a.distance + b.distance,
            soc: a.soc.iter().zip(&b.soc).map(|(x, y)| x + y).collect(),
        }
    }

    fn scale(&self, a: &VehicleState, scale: f64) -> VehicleState {
        VehicleState {
            velocity: a.velocity * scale,
            distance: a.distance * scale,
            soc: a.soc.iter().map(|x| x * scale).collect(),
        }
    }
}
