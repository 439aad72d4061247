//! Per-component stages of a compiled drivetrain.

use ds_components::{Battery, Engine, Gearbox, Motor, Planetary, Vehicle};
use ds_core::CompId;
use ds_topology::{Component, ComponentParams};

/// Physics model bound to one component.
#[derive(Debug, Clone)]
pub enum StageKind {
    Engine(Engine),
    Motor(Motor),
    Gearbox(Gearbox),
    Planetary(Planetary),
    Battery(Battery),
    Vehicle(Vehicle),
}

/// One component in evaluation order.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Position of the source component in the topology.
    pub comp: CompId,
    pub name: String,
    pub kind: StageKind,
}

impl Stage {
    pub fn from_component(comp: CompId, c: &Component) -> Self {
        let name = c.id.clone();
        let kind = match &c.params {
            ComponentParams::Engine(p) => StageKind::Engine(Engine::new(&name, p.clone())),
            ComponentParams::Motor(p) => StageKind::Motor(Motor::new(&name, p.clone())),
            ComponentParams::Gearbox(p) => StageKind::Gearbox(Gearbox::new(&name, p.clone())),
            ComponentParams::Planetary(p) => StageKind::Planetary(Planetary::from(p)),
            ComponentParams::Battery(p) => StageKind::Battery(Battery::new(&name, p.clone())),
            ComponentParams::Vehicle(p) => StageKind::Vehicle(Vehicle::new(&name, p.clone())),
        };
        Self { comp, name, kind }
    }

    pub fn engine(&self) -> Option<&Engine> {
        match &self.kind {
            StageKind::Engine(e) => Some(e),
            _ => None,
        }
    }

    pub fn motor(&self) -> Option<&Motor> {
        match &self.kind {
            StageKind::Motor(m) => Some(m),
            _ => None,
        }
    }

    pub fn gearbox(&self) -> Option<&Gearbox> {
        match &self.kind {
            StageKind::Gearbox(g) => Some(g),
            _ => None,
        }
    }

    pub fn planetary(&self) -> Option<&Planetary> {
        match &self.kind {
            StageKind::Planetary(p) => Some(p),
            _ => None,
        }
    }

    pub fn battery(&self) -> Option<&Battery> {
        match &self.kind {
            StageKind::Battery(b) => Some(b),
            _ => None,
        }
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        match &self.kind {
            StageKind::Vehicle(v) => Some(v),
            _ => None,
        }
    }
}

/// A prime mover seen through its stage.
#[derive(Debug, Clone, Copy)]
pub enum Mover<'a> {
    Engine(&'a Engine),
    Motor(&'a Motor),
}

impl Mover<'_> {
    pub fn is_engine(&self) -> bool {
        matches!(self, Mover::Engine(_))
    }

    /// Maximum shaft speed (rad/s).
    pub fn max_speed(&self) -> f64 {
        match self {
            Mover::Engine(e) => e.max_speed(),
            Mover::Motor(m) => m.max_speed(),
        }
    }

    /// Lowest speed the mover can hold while loaded (rad/s).
    pub fn min_speed(&self) -> f64 {
        match self {
            Mover::Engine(e) => e.idle_speed(),
            Mover::Motor(_) => 0.0,
        }
    }

    /// Driving torque available at `omega`; motors use their boost rating.
    pub fn max_torque(&self, omega: f64) -> f64 {
        match self {
            Mover::Engine(e) => e.max_torque(omega),
            Mover::Motor(m) => m.max_torque(omega, true),
        }
    }

    /// Lowest speed delivering `power` at full load.
    pub fn speed_for_power(&self, power: f64) -> f64 {
        match self {
            Mover::Engine(e) => e.speed_for_power(power),
            Mover::Motor(m) => {
                let t = m.params().t_max;
                (power.max(0.0) / t).min(m.base_speed())
            }
        }
    }
}
