//! ds-topology: drivetrain topology model and validation.
//!
//! Provides:
//! - Port catalogue and typed component parameters with load-time defaults
//! - Topology model and a fluent builder
//! - The `{nodes, edges}` exchange format (JSON and YAML)
//! - Connection resolution and the topology validator
//!
//! # Example
//!
//! ```
//! use ds_topology::{ComponentType, TopologyBuilder, validate};
//!
//! let topo = TopologyBuilder::new()
//!     .with_default("engine-1", ComponentType::Engine)
//!     .with_default("gearbox-1", ComponentType::Gearbox)
//!     .with_default("vehicle-1", ComponentType::Vehicle)
//!     .connect("engine-1", "shaft", "gearbox-1", "input")
//!     .connect("gearbox-1", "output", "vehicle-1", "wheels")
//!     .build()
//!     .unwrap();
//!
//! let report = validate(&topo);
//! assert!(report.is_valid);
//! ```

pub mod builder;
pub mod error;
pub mod format;
pub mod model;
pub mod params;
pub mod ports;
pub mod resolve;
pub mod validate;

pub use builder::TopologyBuilder;
pub use error::{TopologyError, TopologyResult};
pub use format::{
    EdgeDoc, NodeDoc, TopologyDoc, from_json_str, from_yaml_str, to_json_string, to_yaml_string,
};
pub use model::{Component, Connection, Topology};
pub use params::*;
pub use ports::{ComponentType, PortDomain, PortRole, PortSpec, canonical_handle};
pub use resolve::{ElectricalLink, MechanicalLink, Resolved, resolve};
pub use validate::{ValidationIssue, ValidationReport, mechanical_graph, validate};
