//! Vehicle body: mass, wheel, and longitudinal road load.

use ds_core::constants::G0_MPS2;
use ds_topology::VehicleParams;

use crate::gearbox::GearStage;

#[derive(Debug, Clone)]
pub struct Vehicle {
    name: String,
    params: VehicleParams,
}

/// Road-load contributions at one operating point (N).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoadLoad {
    pub rolling: f64,
    pub grade: f64,
    pub aero: f64,
}

impl RoadLoad {
    pub fn total(&self) -> f64 {
        self.rolling + self.grade + self.aero
    }
}

impl Vehicle {
    pub fn new(name: impl Into<String>, params: VehicleParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub fn mass(&self, payload_fraction: f64) -> f64 {
        self.params.mass(payload_fraction)
    }

    /// Gross vehicle mass (empty plus full payload).
    pub fn gross_mass(&self) -> f64 {
        self.params.mass(1.0)
    }

    pub fn wheel_radius(&self) -> f64 {
        self.params.r_wheel
    }

    /// Axle reduction between the driveline output and the wheels.
    pub fn final_drive(&self) -> GearStage {
        GearStage::new(self.params.final_drive, self.params.final_drive_efficiency)
    }

    /// Wheel angular speed for a road speed (rad/s).
    pub fn wheel_speed(&self, velocity: f64) -> f64 {
        velocity / self.params.r_wheel
    }

    /// Road speed for a wheel angular speed (m/s).
    pub fn velocity(&self, wheel_speed: f64) -> f64 {
        wheel_speed * self.params.r_wheel
    }

    /// Rolling plus grade resistance; no aero.
    ///
    /// `grade` is rise over run (0.05 = 5 %).
    pub fn grade_resistance(&self, mass: f64, grade: f64) -> f64 {
        let theta = grade.atan();
        mass * G0_MPS2 * (self.params.c_r * theta.cos() + theta.sin())
    }

    /// Full road load at speed `velocity` (m/s).
    pub fn road_load(&self, mass: f64, velocity: f64, grade: f64) -> RoadLoad {
        let theta = grade.atan();
        let p = &self.params;
        RoadLoad {
            rolling: mass * G0_MPS2 * p.c_r * theta.cos(),
            grade: mass * G0_MPS2 * theta.sin(),
            aero: 0.5 * p.rho_air * p.c_d * p.a_frontal * velocity * velocity.abs(),
        }
    }
}
