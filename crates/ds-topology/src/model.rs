//! Topology model: components and the connections between their ports.

use std::collections::HashMap;

use ds_core::CompId;
use serde::{Deserialize, Serialize};

use crate::error::{TopologyError, TopologyResult};
use crate::format::TopologyDoc;
use crate::params::ComponentParams;
use crate::ports::ComponentType;

/// A drivetrain component with its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: String,
    pub label: Option<String>,
    pub params: ComponentParams,
}

impl Component {
    pub fn new(id: impl Into<String>, params: ComponentParams) -> Self {
        Self {
            id: id.into(),
            label: None,
            params,
        }
    }

    pub fn kind(&self) -> ComponentType {
        self.params.kind()
    }

    /// Label if set, id otherwise.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// A link from one component port to another.
///
/// Handles are stored as written; the port catalogue resolves aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub source_port: String,
    pub target: String,
    pub target_port: String,
}

/// Components plus connections, immutable once built.
///
/// Serializes through the `{nodes, edges}` exchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TopologyDoc", try_from = "TopologyDoc")]
pub struct Topology {
    components: Vec<Component>,
    connections: Vec<Connection>,
    by_id: HashMap<String, CompId>,
}

impl Topology {
    /// Assemble a topology without checking parameters.
    ///
    /// With duplicate ids the first component wins lookups; the validator
    /// reports the duplicates.
    pub fn new(components: Vec<Component>, connections: Vec<Connection>) -> Self {
        let mut by_id = HashMap::with_capacity(components.len());
        for (i, c) in components.iter().enumerate() {
            by_id.entry(c.id.clone()).or_insert(CompId::from_usize(i));
        }
        Self {
            components,
            connections,
            by_id,
        }
    }

    /// Normalize parameter sets and reject out-of-range values.
    pub fn checked(components: Vec<Component>, connections: Vec<Connection>) -> TopologyResult<Self> {
        let components = components
            .into_iter()
            .map(|c| {
                let params = c.params.normalized();
                if let Some(issue) = params.issues().into_iter().next() {
                    return Err(TopologyError::InvalidParam {
                        component: c.id,
                        field: issue.field.to_string(),
                        reason: issue.reason.to_string(),
                    });
                }
                Ok(Component { params, ..c })
            })
            .collect::<TopologyResult<Vec<_>>>()?;
        Ok(Self::new(components, connections))
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn get(&self, id: CompId) -> Option<&Component> {
        self.components.get(id.idx())
    }

    pub fn position(&self, id: &str) -> Option<CompId> {
        self.by_id.get(id).copied()
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.position(id).and_then(|i| self.get(i))
    }

    /// Components of one type, in declaration order.
    pub fn of_kind(&self, kind: ComponentType) -> impl Iterator<Item = (CompId, &Component)> {
        self.iter().filter(move |(_, c)| c.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CompId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(i, c)| (CompId::from_usize(i), c))
    }

    /// First vehicle component, if any.
    pub fn vehicle(&self) -> Option<(CompId, &Component)> {
        self.of_kind(ComponentType::Vehicle).next()
    }

    pub fn has_engine(&self) -> bool {
        self.of_kind(ComponentType::Engine).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
