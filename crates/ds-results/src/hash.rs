//! Content-based hashing for run IDs.

use ds_sim::SimConfig;
use ds_topology::Topology;
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// Version string folded into every run ID.
pub const ENGINE_VERSION: &str = concat!("drivesim-", env!("CARGO_PKG_VERSION"));

/// SHA-256 over the exchange document, the config and the engine version.
///
/// Topologies that serialize identically share an ID regardless of how
/// they were built.
pub fn compute_run_id(
    topology: &Topology,
    config: &SimConfig,
    engine_version: &str,
) -> ResultsResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(topology)?.as_bytes());
    hasher.update(serde_json::to_string(config)?.as_bytes());
    hasher.update(engine_version.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds_topology::{ComponentType, TopologyBuilder};

    fn diesel() -> Topology {
        TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .with_default("gearbox-1", ComponentType::Gearbox)
            .with_default("vehicle-1", ComponentType::Vehicle)
            .connect("engine-1", "shaft", "gearbox-1", "input")
            .connect("gearbox-1", "output", "vehicle-1", "wheels")
            .build()
            .unwrap()
    }

    #[test]
    fn hash_stability() {
        let cfg = SimConfig::default();
        let a = compute_run_id(&diesel(), &cfg, "v1").unwrap();
        let b = compute_run_id(&diesel(), &cfg, "v1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let topo = diesel();
        let base = compute_run_id(&topo, &SimConfig::default(), "v1").unwrap();
        let uphill = SimConfig {
            grade: 0.05,
            ..SimConfig::default()
        };
        assert_ne!(base, compute_run_id(&topo, &uphill, "v1").unwrap());
        assert_ne!(base, compute_run_id(&topo, &SimConfig::default(), "v2").unwrap());
    }
}
