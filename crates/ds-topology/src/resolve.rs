//! Resolve raw connections against the port catalogue.
//!
//! Mechanical connections are oriented by port role, so a link always points
//! from the driving (output) side toward the driven (input) side regardless of
//! which end the editor recorded as `source`.

use std::collections::HashMap;

use ds_core::CompId;

use crate::model::Topology;
use crate::ports::{PortDomain, PortRole, PortSpec};
use crate::validate::ValidationIssue;

/// A mechanical shaft from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MechanicalLink {
    /// Position of the connection in the topology.
    pub connection: usize,
    pub upstream: CompId,
    pub upstream_port: &'static str,
    pub downstream: CompId,
    pub downstream_port: &'static str,
}

/// An electrical bus tap between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectricalLink {
    pub connection: usize,
    pub a: CompId,
    pub b: CompId,
}

impl ElectricalLink {
    /// The far end seen from `c`, if `c` is on this link.
    pub fn other(&self, c: CompId) -> Option<CompId> {
        if self.a == c {
            Some(self.b)
        } else if self.b == c {
            Some(self.a)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub mechanical: Vec<MechanicalLink>,
    pub electrical: Vec<ElectricalLink>,
    /// Connection-level problems, in connection order, then overloaded ports.
    pub issues: Vec<ValidationIssue>,
}

impl Resolved {
    /// The link driving `port` of `comp`, if connected.
    pub fn feeding(&self, comp: CompId, port: &str) -> Option<&MechanicalLink> {
        self.mechanical
            .iter()
            .find(|l| l.downstream == comp && l.downstream_port == port)
    }

    /// The link leaving `port` of `comp`, if connected.
    pub fn leaving(&self, comp: CompId, port: &str) -> Option<&MechanicalLink> {
        self.mechanical
            .iter()
            .find(|l| l.upstream == comp && l.upstream_port == port)
    }

    pub fn is_connected(&self, comp: CompId, port: &PortSpec) -> bool {
        match port.domain {
            PortDomain::Mechanical => {
                self.feeding(comp, port.name).is_some() || self.leaving(comp, port.name).is_some()
            }
            PortDomain::Electrical => self.electrical.iter().any(|l| l.other(comp).is_some()),
        }
    }

    /// Components sharing an electrical link with `comp`.
    pub fn electrical_peers(&self, comp: CompId) -> impl Iterator<Item = CompId> + '_ {
        self.electrical.iter().filter_map(move |l| l.other(comp))
    }
}

pub fn resolve(topo: &Topology) -> Resolved {
    let mut out = Resolved::default();
    let mut usage: HashMap<(CompId, &'static str), usize> = HashMap::new();

    for (i, conn) in topo.connections().iter().enumerate() {
        let Some(src) = endpoint(topo, i, &conn.source, &conn.source_port, &mut out.issues) else {
            continue;
        };
        let Some(dst) = endpoint(topo, i, &conn.target, &conn.target_port, &mut out.issues) else {
            continue;
        };

        if src.1.domain != dst.1.domain {
            out.issues.push(ValidationIssue::DomainMismatch {
                connection: conn.id.clone(),
            });
            continue;
        }

        match src.1.domain {
            PortDomain::Electrical => out.electrical.push(ElectricalLink {
                connection: i,
                a: src.0,
                b: dst.0,
            }),
            PortDomain::Mechanical => {
                let (up, down) = match (src.1.role, dst.1.role) {
                    (PortRole::Output, PortRole::Input) => (src, dst),
                    (PortRole::Input, PortRole::Output) => (dst, src),
                    _ => {
                        out.issues.push(ValidationIssue::RoleMismatch {
                            connection: conn.id.clone(),
                        });
                        continue;
                    }
                };
                *usage.entry((up.0, up.1.name)).or_default() += 1;
                *usage.entry((down.0, down.1.name)).or_default() += 1;
                out.mechanical.push(MechanicalLink {
                    connection: i,
                    upstream: up.0,
                    upstream_port: up.1.name,
                    downstream: down.0,
                    downstream_port: down.1.name,
                });
            }
        }
    }

    for (id, comp) in topo.iter() {
        for port in comp.kind().ports() {
            if usage.get(&(id, port.name)).copied().unwrap_or(0) > 1 {
                out.issues.push(ValidationIssue::PortOverloaded {
                    component: comp.id.clone(),
                    port: port.name.to_string(),
                });
            }
        }
    }

    out
}

fn endpoint(
    topo: &Topology,
    conn: usize,
    comp_id: &str,
    handle: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<(CompId, &'static PortSpec)> {
    let connection = topo.connections()[conn].id.clone();
    let Some(pos) = topo.position(comp_id) else {
        issues.push(ValidationIssue::UnknownComponent {
            connection,
            component: comp_id.to_string(),
        });
        return None;
    };
    let kind = topo.get(pos)?.kind();
    match kind.port(handle) {
        Some(spec) => Some((pos, spec)),
        None => {
            issues.push(ValidationIssue::UnknownPort {
                connection,
                component: comp_id.to_string(),
                port: handle.to_string(),
            });
            None
        }
    }
}
