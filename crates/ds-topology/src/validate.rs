//! Topology rule checks.
//!
//! `validate` never fails: it collects every violated rule into a report.
//! A report with `is_valid == false` blocks compilation and any run.

use std::collections::HashSet;

use ds_core::CompId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use serde::Serialize;
use tracing::debug;

use crate::model::Topology;
use crate::ports::ComponentType;
use crate::resolve::{Resolved, resolve};

/// A single violated topology rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("No prime mover: add an engine or a motor")]
    NoPrimeMover,

    #[error("No vehicle component")]
    MissingVehicle,

    #[error("Only one vehicle is allowed, found: {}", ids.join(", "))]
    MultipleVehicles { ids: Vec<String> },

    #[error("Duplicate component id: {id}")]
    DuplicateComponentId { id: String },

    #[error("Connection {connection} references unknown component {component}")]
    UnknownComponent {
        connection: String,
        component: String,
    },

    #[error("Connection {connection} references unknown port {component}.{port}")]
    UnknownPort {
        connection: String,
        component: String,
        port: String,
    },

    #[error("Connection {connection} joins mechanical and electrical ports")]
    DomainMismatch { connection: String },

    #[error("Connection {connection} must join an output shaft to an input shaft")]
    RoleMismatch { connection: String },

    #[error("Port {component}.{port} carries more than one shaft")]
    PortOverloaded { component: String, port: String },

    #[error("Mandatory port {component}.{port} is not connected")]
    UnconnectedPort { component: String, port: String },

    #[error("Component {component} is not on a driven path from a prime mover to the vehicle")]
    Unreachable { component: String },

    #[error("Battery {component} is not connected to any motor")]
    BatteryUnattached { component: String },

    #[error("Mechanical cycle through: {}", components.join(" -> "))]
    MechanicalCycle { components: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check every topology rule and return all violations.
pub fn validate(topo: &Topology) -> ValidationReport {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for c in topo.components() {
        if !seen.insert(c.id.as_str()) {
            issues.push(ValidationIssue::DuplicateComponentId { id: c.id.clone() });
        }
    }

    if !topo.components().iter().any(|c| c.kind().is_prime_mover()) {
        issues.push(ValidationIssue::NoPrimeMover);
    }

    let vehicles: Vec<CompId> = topo.of_kind(ComponentType::Vehicle).map(|(i, _)| i).collect();
    match vehicles.len() {
        0 => issues.push(ValidationIssue::MissingVehicle),
        1 => {}
        _ => issues.push(ValidationIssue::MultipleVehicles {
            ids: topo
                .of_kind(ComponentType::Vehicle)
                .map(|(_, c)| c.id.clone())
                .collect(),
        }),
    }

    let resolved = resolve(topo);
    issues.extend(resolved.issues.iter().cloned());

    let graph = mechanical_graph(topo, &resolved);
    if let Some(cycle) = first_cycle(topo, &graph) {
        issues.push(ValidationIssue::MechanicalCycle { components: cycle });
    }

    // Without a vehicle every path is open-ended; those failures are
    // consequences of the missing vehicle and are not reported.
    if !vehicles.is_empty() {
        check_ports(topo, &resolved, &mut issues);
        check_reachability(topo, &resolved, &graph, &vehicles, &mut issues);
    }

    let report = ValidationReport::from_issues(issues);
    debug!(
        components = topo.len(),
        errors = report.errors.len(),
        "topology validated"
    );
    report
}

/// Component graph with one edge per mechanical link, upstream to downstream.
///
/// Node indices coincide with component positions.
pub fn mechanical_graph(topo: &Topology, resolved: &Resolved) -> DiGraph<CompId, usize> {
    let mut g = DiGraph::with_capacity(topo.len(), resolved.mechanical.len());
    for (id, _) in topo.iter() {
        g.add_node(id);
    }
    for link in &resolved.mechanical {
        g.add_edge(
            NodeIndex::new(link.upstream.idx()),
            NodeIndex::new(link.downstream.idx()),
            link.connection,
        );
    }
    g
}

fn first_cycle(topo: &Topology, g: &DiGraph<CompId, usize>) -> Option<Vec<String>> {
    let mut cyclic: Vec<Vec<usize>> = tarjan_scc(g)
        .into_iter()
        .filter(|scc| scc.len() > 1 || g.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut idx: Vec<usize> = scc.into_iter().map(NodeIndex::index).collect();
            idx.sort_unstable();
            idx
        })
        .collect();
    cyclic.sort();
    let first = cyclic.into_iter().next()?;
    Some(
        first
            .into_iter()
            .map(|i| topo.components()[i].id.clone())
            .collect(),
    )
}

fn check_ports(topo: &Topology, resolved: &Resolved, issues: &mut Vec<ValidationIssue>) {
    for (id, comp) in topo.iter() {
        for port in comp.kind().ports().iter().filter(|p| p.mandatory) {
            if !resolved.is_connected(id, port) {
                issues.push(ValidationIssue::UnconnectedPort {
                    component: comp.id.clone(),
                    port: port.name.to_string(),
                });
            }
        }
    }
}

fn check_reachability(
    topo: &Topology,
    resolved: &Resolved,
    g: &DiGraph<CompId, usize>,
    vehicles: &[CompId],
    issues: &mut Vec<ValidationIssue>,
) {
    // Everything that drives some vehicle.
    let mut to_wheels = HashSet::new();
    for v in vehicles {
        let rev = Reversed(g);
        let mut bfs = Bfs::new(rev, NodeIndex::new(v.idx()));
        while let Some(n) = bfs.next(rev) {
            to_wheels.insert(n.index());
        }
    }

    // Everything driven by some prime mover.
    let mut from_movers = HashSet::new();
    for (id, _) in topo.iter().filter(|(_, c)| c.kind().is_prime_mover()) {
        let mut bfs = Bfs::new(g, NodeIndex::new(id.idx()));
        while let Some(n) = bfs.next(g) {
            from_movers.insert(n.index());
        }
    }

    for (id, comp) in topo.iter() {
        match comp.kind() {
            ComponentType::Battery => {
                let has_motor = resolved
                    .electrical_peers(id)
                    .filter_map(|p| topo.get(p))
                    .any(|p| p.kind() == ComponentType::Motor);
                if !has_motor {
                    issues.push(ValidationIssue::BatteryUnattached {
                        component: comp.id.clone(),
                    });
                }
            }
            _ => {
                let i = id.idx();
                if !(to_wheels.contains(&i) && from_movers.contains(&i)) {
                    issues.push(ValidationIssue::Unreachable {
                        component: comp.id.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TopologyBuilder;

    fn diesel() -> TopologyBuilder {
        TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .with_default("gearbox-1", ComponentType::Gearbox)
            .with_default("vehicle-1", ComponentType::Vehicle)
            .connect("engine-1", "shaft", "gearbox-1", "input")
            .connect("gearbox-1", "output", "vehicle-1", "wheels")
    }

    #[test]
    fn diesel_chain_is_valid() {
        let report = validate(&diesel().build().unwrap());
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn missing_vehicle_reports_only_that() {
        let topo = TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .with_default("gearbox-1", ComponentType::Gearbox)
            .connect("engine-1", "shaft", "gearbox-1", "input")
            .build()
            .unwrap();
        let report = validate(&topo);
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec![ValidationIssue::MissingVehicle]);
    }

    #[test]
    fn empty_topology_reports_all_at_once() {
        let report = validate(&TopologyBuilder::new().build().unwrap());
        assert_eq!(
            report.errors,
            vec![ValidationIssue::NoPrimeMover, ValidationIssue::MissingVehicle]
        );
    }

    #[test]
    fn dangling_gearbox_is_unreachable_and_unconnected() {
        let topo = diesel()
            .with_default("gearbox-2", ComponentType::Gearbox)
            .build()
            .unwrap();
        let report = validate(&topo);
        assert_eq!(
            report.errors,
            vec![
                ValidationIssue::UnconnectedPort {
                    component: "gearbox-2".into(),
                    port: "input".into()
                },
                ValidationIssue::UnconnectedPort {
                    component: "gearbox-2".into(),
                    port: "output".into()
                },
                ValidationIssue::Unreachable {
                    component: "gearbox-2".into()
                },
            ]
        );
    }

    #[test]
    fn edge_count_alone_does_not_satisfy_reachability() {
        // Both gearbox ports are wired, but only to each other.
        let topo = diesel()
            .with_default("gearbox-a", ComponentType::Gearbox)
            .with_default("gearbox-b", ComponentType::Gearbox)
            .connect("gearbox-a", "output", "gearbox-b", "input")
            .connect("gearbox-b", "output", "gearbox-a", "input")
            .build()
            .unwrap();
        let report = validate(&topo);
        assert!(report.errors.contains(&ValidationIssue::MechanicalCycle {
            components: vec!["gearbox-a".into(), "gearbox-b".into()]
        }));
        assert!(report.errors.contains(&ValidationIssue::Unreachable {
            component: "gearbox-a".into()
        }));
    }

    #[test]
    fn battery_needs_a_motor() {
        let topo = diesel()
            .with_default("battery-1", ComponentType::Battery)
            .build()
            .unwrap();
        let report = validate(&topo);
        assert!(report.errors.contains(&ValidationIssue::BatteryUnattached {
            component: "battery-1".into()
        }));
        assert!(report.errors.contains(&ValidationIssue::UnconnectedPort {
            component: "battery-1".into(),
            port: "electrical".into()
        }));
    }

    #[test]
    fn issues_render_readably() {
        let issue = ValidationIssue::MultipleVehicles {
            ids: vec!["v1".into(), "v2".into()],
        };
        assert_eq!(issue.to_string(), "Only one vehicle is allowed, found: v1, v2");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "multiple_vehicles");
    }
}
