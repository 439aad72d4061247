//! Topology loading errors.

pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors raised while loading or building a topology.
///
/// Rule violations in a loaded topology are not errors; they are collected
/// by [`crate::validate`] into a report.
#[derive(thiserror::Error, Debug)]
pub enum TopologyError {
    #[error("Component '{component}': invalid parameter {field} ({reason})")]
    InvalidParam {
        component: String,
        field: String,
        reason: String,
    },

    #[error("Component '{component}': malformed parameters: {message}")]
    MalformedParams { component: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

