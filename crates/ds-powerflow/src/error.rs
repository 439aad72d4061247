//! Compile errors.

use ds_components::ComponentError;
use ds_topology::ValidationIssue;
use thiserror::Error;

/// Structural problems found while compiling a topology.
///
/// These are distinct from validator issues: the compiler refuses a
/// topology it cannot turn into drive paths even if nobody validated it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Connection problem: {0}")]
    Connection(ValidationIssue),

    #[error("No vehicle component")]
    MissingVehicle,

    #[error("More than one vehicle component")]
    MultipleVehicles,

    #[error("No prime mover")]
    NoPrimeMover,

    #[error("Mandatory port {component}.{port} is not connected")]
    UnconnectedPort { component: String, port: String },

    #[error("Mechanical cycle through {component}")]
    Cycle { component: String },

    #[error("Drive path from {component} never reaches the vehicle")]
    NoPathToVehicle { component: String },

    #[error("Motor {motor} is wired to more than one battery")]
    MultipleBatteries { motor: String },

    #[error("Only one planetary set is supported (found another at {component})")]
    MultiplePlanetaries { component: String },

    #[error("Planetary {planetary} has no prime mover on its {member} side")]
    PlanetaryMissingMover {
        planetary: String,
        member: &'static str,
    },

    #[error("Planetary {planetary} has more than one prime mover on its {member} side")]
    PlanetaryCrowded {
        planetary: String,
        member: &'static str,
    },

    #[error("Engine {engine} sits on a planetary reaction (sun) path")]
    EngineOnReaction { engine: String },

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),
}

pub type CompileResult<T> = Result<T, CompileError>;
