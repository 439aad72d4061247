//! Fluent topology builder.

use crate::error::TopologyResult;
use crate::model::{Component, Connection, Topology};
use crate::params::ComponentParams;
use crate::ports::ComponentType;

/// Builder for assembling a topology in code.
///
/// Connections get sequential ids `e1`, `e2`, ... in the order they are
/// added. `build()` normalizes and range-checks parameters; rule checks are
/// left to [`crate::validate`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    components: Vec<Component>,
    connections: Vec<Connection>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component with explicit parameters.
    pub fn with(mut self, id: impl Into<String>, params: ComponentParams) -> Self {
        self.components.push(Component::new(id, params));
        self
    }

    /// Add a component with default parameters for its type.
    pub fn with_default(self, id: impl Into<String>, kind: ComponentType) -> Self {
        self.with(id, ComponentParams::default_for(kind))
    }

    /// Label the most recently added component.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        if let Some(c) = self.components.last_mut() {
            c.label = Some(label.into());
        }
        self
    }

    pub fn connect(
        mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        let id = format!("e{}", self.connections.len() + 1);
        self.connections.push(Connection {
            id,
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        });
        self
    }

    pub fn build(self) -> TopologyResult<Topology> {
        Topology::checked(self.components, self.connections)
    }
}
