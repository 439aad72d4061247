//! `{nodes, edges}` exchange document.
//!
//! This is the shape the graph editor exports. Unknown node and edge fields
//! (position, style, selection state) are ignored on load; the optional
//! `label` is kept.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TopologyError, TopologyResult};
use crate::model::{Component, Connection, Topology};
use crate::params::{
    BatteryParams, ComponentParams, EngineParams, GearboxParams, MotorParams, PlanetaryParams,
    VehicleParams,
};
use crate::ports::ComponentType;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyDoc {
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
    #[serde(default)]
    pub edges: Vec<EdgeDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDoc {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

fn parse_params(node: &NodeDoc) -> TopologyResult<ComponentParams> {
    fn typed<T: serde::de::DeserializeOwned>(node: &NodeDoc) -> TopologyResult<T> {
        let value = match &node.params {
            Value::Null => Value::Object(Default::default()),
            v => v.clone(),
        };
        serde_json::from_value(value).map_err(|e| TopologyError::MalformedParams {
            component: node.id.clone(),
            message: e.to_string(),
        })
    }

    Ok(match node.kind {
        ComponentType::Engine => ComponentParams::Engine(typed::<EngineParams>(node)?),
        ComponentType::Motor => ComponentParams::Motor(typed::<MotorParams>(node)?),
        ComponentType::Gearbox => ComponentParams::Gearbox(typed::<GearboxParams>(node)?),
        ComponentType::Planetary => ComponentParams::Planetary(typed::<PlanetaryParams>(node)?),
        ComponentType::Battery => ComponentParams::Battery(typed::<BatteryParams>(node)?),
        ComponentType::Vehicle => ComponentParams::Vehicle(typed::<VehicleParams>(node)?),
    })
}

fn params_value(params: &ComponentParams) -> Value {
    serde_json::to_value(params)
        .ok()
        .and_then(|mut v| v.get_mut("params").map(Value::take))
        .unwrap_or(Value::Null)
}

/// A missing handle is inferred when the node type has a single port.
fn infer_handle(nodes: &[NodeDoc], node_id: &str, handle: Option<String>) -> String {
    if let Some(h) = handle {
        return h;
    }
    nodes
        .iter()
        .find(|n| n.id == node_id)
        .map(|n| n.kind.ports())
        .filter(|ports| ports.len() == 1)
        .map(|ports| ports[0].name.to_string())
        .unwrap_or_default()
}

impl TryFrom<TopologyDoc> for Topology {
    type Error = TopologyError;

    fn try_from(doc: TopologyDoc) -> TopologyResult<Self> {
        let components = doc
            .nodes
            .iter()
            .map(|n| {
                Ok(Component {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    params: parse_params(n)?,
                })
            })
            .collect::<TopologyResult<Vec<_>>>()?;

        let connections = doc
            .edges
            .into_iter()
            .map(|e| Connection {
                source_port: infer_handle(&doc.nodes, &e.source, e.source_handle),
                target_port: infer_handle(&doc.nodes, &e.target, e.target_handle),
                id: e.id,
                source: e.source,
                target: e.target,
            })
            .collect();

        Topology::checked(components, connections)
    }
}

impl From<&Topology> for TopologyDoc {
    fn from(topo: &Topology) -> Self {
        TopologyDoc {
            nodes: topo
                .components()
                .iter()
                .map(|c| NodeDoc {
                    id: c.id.clone(),
                    kind: c.kind(),
                    params: params_value(&c.params),
                    label: c.label.clone(),
                })
                .collect(),
            edges: topo
                .connections()
                .iter()
                .map(|c| EdgeDoc {
                    id: c.id.clone(),
                    source: c.source.clone(),
                    target: c.target.clone(),
                    source_handle: Some(c.source_port.clone()),
                    target_handle: Some(c.target_port.clone()),
                })
                .collect(),
        }
    }
}

impl From<Topology> for TopologyDoc {
    fn from(topo: Topology) -> Self {
        TopologyDoc::from(&topo)
    }
}

pub fn from_json_str(s: &str) -> TopologyResult<Topology> {
    let doc: TopologyDoc = serde_json::from_str(s)?;
    Topology::try_from(doc)
}

pub fn to_json_string(topo: &Topology) -> TopologyResult<String> {
    Ok(serde_json::to_string_pretty(&TopologyDoc::from(topo))?)
}

pub fn from_yaml_str(s: &str) -> TopologyResult<Topology> {
    let doc: TopologyDoc = serde_yaml::from_str(s)?;
    Topology::try_from(doc)
}

pub fn to_yaml_string(topo: &Topology) -> TopologyResult<String> {
    Ok(serde_yaml::to_string(&TopologyDoc::from(topo))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITOR_EXPORT: &str = r#"{
        "nodes": [
            {"id": "engine-1", "type": "engine", "position": {"x": 0, "y": 0},
             "params": {"rpmIdle": 700, "rpmMax": 1800, "pRated": 1801000, "tPeak": 11220}},
            {"id": "gearbox-1", "type": "gearbox", "label": "7-speed",
             "params": {"ratios": [4.59, 2.95, 1.94, 1.40, 1.0, 0.74, 0.65]}},
            {"id": "vehicle-1", "type": "vehicle"}
        ],
        "edges": [
            {"id": "e1", "source": "engine-1", "target": "gearbox-1",
             "sourceHandle": "shaft", "targetHandle": "input", "animated": true},
            {"id": "e2", "source": "gearbox-1", "target": "vehicle-1",
             "sourceHandle": "output", "targetHandle": null}
        ]
    }"#;

    #[test]
    fn editor_export_loads_with_defaults() {
        let topo = from_json_str(EDITOR_EXPORT).unwrap();
        assert_eq!(topo.len(), 3);
        let gb = topo.component("gearbox-1").unwrap();
        assert_eq!(gb.label.as_deref(), Some("7-speed"));
        match &gb.params {
            ComponentParams::Gearbox(g) => assert_eq!(g.efficiencies, vec![0.97; 7]),
            other => panic!("unexpected {other:?}"),
        }
        // Vehicle has one port, so the null handle is inferred.
        assert_eq!(topo.connections()[1].target_port, "wheels");
    }

    #[test]
    fn json_and_yaml_agree() {
        let topo = from_json_str(EDITOR_EXPORT).unwrap();
        let yaml = to_yaml_string(&topo).unwrap();
        let back = from_yaml_str(&yaml).unwrap();
        assert_eq!(back, topo);
        let json = to_json_string(&back).unwrap();
        assert_eq!(from_json_str(&json).unwrap(), topo);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = from_json_str(r#"{"nodes": [{"id": "x", "type": "flywheel"}], "edges": []}"#)
            .unwrap_err();
        assert!(matches!(err, TopologyError::Json(_)));
    }

    #[test]
    fn malformed_params_name_the_component() {
        let err = from_json_str(
            r#"{"nodes": [{"id": "gb", "type": "gearbox", "params": {"ratios": "fast"}}]}"#,
        )
        .unwrap_err();
        match err {
            TopologyError::MalformedParams { component, .. } => assert_eq!(component, "gb"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn efficiency_length_mismatch_is_invalid_param() {
        let err = from_json_str(
            r#"{"nodes": [{"id": "gb", "type": "gearbox",
                "params": {"ratios": [3.0, 1.0], "efficiencies": [0.97]}}]}"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, TopologyError::InvalidParam { ref field, .. } if field == "efficiencies")
        );
    }
}
