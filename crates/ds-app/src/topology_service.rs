//! Topology file loading and saving.
//!
//! `.yaml`/`.yml` files use YAML; everything else is read as JSON.

use std::path::Path;

use ds_topology::{
    Topology, ValidationReport, from_json_str, from_yaml_str, to_json_string, to_yaml_string,
    validate,
};

use crate::error::{AppError, AppResult};

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Load a topology from a JSON or YAML exchange document.
pub fn load_topology(path: &Path) -> AppResult<Topology> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let topo = if is_yaml(path) {
        from_yaml_str(&content)?
    } else {
        from_json_str(&content)?
    };
    Ok(topo)
}

/// Save a topology in the format implied by the extension.
pub fn save_topology(path: &Path, topology: &Topology) -> AppResult<()> {
    let content = if is_yaml(path) {
        to_yaml_string(topology)?
    } else {
        to_json_string(topology)?
    };
    std::fs::write(path, content).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Validator report, or `Validation` listing every issue.
pub fn require_valid(topology: &Topology) -> AppResult<ValidationReport> {
    let report = validate(topology);
    if report.is_valid {
        return Ok(report);
    }
    let message = report
        .errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(AppError::Validation(message))
}
