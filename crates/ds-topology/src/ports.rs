//! Port catalogue: the fixed set of ports each component type exposes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of component in a drivetrain topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Engine,
    Motor,
    Gearbox,
    Planetary,
    Battery,
    Vehicle,
}

impl ComponentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Engine => "engine",
            ComponentType::Motor => "motor",
            ComponentType::Gearbox => "gearbox",
            ComponentType::Planetary => "planetary",
            ComponentType::Battery => "battery",
            ComponentType::Vehicle => "vehicle",
        }
    }

    /// Engines and motors can put torque into the driveline.
    pub fn is_prime_mover(self) -> bool {
        matches!(self, ComponentType::Engine | ComponentType::Motor)
    }

    /// All ports of this component type, in declaration order.
    pub fn ports(self) -> &'static [PortSpec] {
        match self {
            ComponentType::Engine => ENGINE_PORTS,
            ComponentType::Motor => MOTOR_PORTS,
            ComponentType::Gearbox => GEARBOX_PORTS,
            ComponentType::Planetary => PLANETARY_PORTS,
            ComponentType::Battery => BATTERY_PORTS,
            ComponentType::Vehicle => VEHICLE_PORTS,
        }
    }

    /// Look up a port by handle, resolving editor aliases.
    pub fn port(self, handle: &str) -> Option<&'static PortSpec> {
        let canonical = canonical_handle(self, handle);
        self.ports().iter().find(|p| p.name == canonical)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical domain a port belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDomain {
    Mechanical,
    Electrical,
}

/// Direction of power flow a port is designed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRole {
    /// Receives a shaft from upstream.
    Input,
    /// Drives a shaft downstream.
    Output,
    /// Electrical bus tap; power may flow either way.
    Bidirectional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub name: &'static str,
    pub domain: PortDomain,
    pub role: PortRole,
    /// Must be connected before the component can be compiled.
    pub mandatory: bool,
}

const fn port(
    name: &'static str,
    domain: PortDomain,
    role: PortRole,
    mandatory: bool,
) -> PortSpec {
    PortSpec {
        name,
        domain,
        role,
        mandatory,
    }
}

use PortDomain::{Electrical, Mechanical};
use PortRole::{Bidirectional, Input, Output};

pub const SHAFT: &str = "shaft";
pub const SHAFT_IN: &str = "shaft-in";
pub const ELECTRICAL: &str = "electrical";
pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";
pub const SUN: &str = "sun";
pub const CARRIER: &str = "carrier";
pub const RING: &str = "ring";
pub const WHEELS: &str = "wheels";

const ENGINE_PORTS: &[PortSpec] = &[port(SHAFT, Mechanical, Output, true)];

const MOTOR_PORTS: &[PortSpec] = &[
    port(SHAFT, Mechanical, Output, true),
    port(SHAFT_IN, Mechanical, Input, false),
    port(ELECTRICAL, Electrical, Bidirectional, false),
];

const GEARBOX_PORTS: &[PortSpec] = &[
    port(INPUT, Mechanical, Input, true),
    port(OUTPUT, Mechanical, Output, true),
];

const PLANETARY_PORTS: &[PortSpec] = &[
    port(SUN, Mechanical, Input, true),
    port(CARRIER, Mechanical, Input, true),
    port(RING, Mechanical, Output, true),
];

const BATTERY_PORTS: &[PortSpec] = &[port(ELECTRICAL, Electrical, Bidirectional, true)];

const VEHICLE_PORTS: &[PortSpec] = &[port(WHEELS, Mechanical, Input, true)];

/// Map editor handle aliases onto catalogue names.
pub fn canonical_handle(kind: ComponentType, handle: &str) -> &str {
    match (kind, handle) {
        (ComponentType::Motor, "shaft-out") => SHAFT,
        _ => handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_aliases_resolve_to_shaft() {
        let p = ComponentType::Motor.port("shaft-out").unwrap();
        assert_eq!(p.name, SHAFT);
        assert_eq!(p.role, PortRole::Output);
        assert!(ComponentType::Motor.port(SHAFT_IN).is_some());
    }

    #[test]
    fn planetary_members_are_mechanical() {
        let ports = ComponentType::Planetary.ports();
        assert_eq!(ports.len(), 3);
        assert!(ports.iter().all(|p| p.domain == PortDomain::Mechanical));
        assert!(ports.iter().all(|p| p.mandatory));
    }

    #[test]
    fn unknown_handle_is_none() {
        assert!(ComponentType::Gearbox.port("shaft").is_none());
        assert!(ComponentType::Engine.port("shaft-out").is_none());
    }

    #[test]
    fn prime_movers() {
        assert!(ComponentType::Engine.is_prime_mover());
        assert!(ComponentType::Motor.is_prime_mover());
        assert!(!ComponentType::Gearbox.is_prime_mover());
        assert!(!ComponentType::Battery.is_prime_mover());
    }
}
