//! Run storage API.
//!
//! One directory per run ID holding `manifest.json` plus the artifacts
//! saved for it (`result.json`, `rimpull.json`).

use std::fs;
use std::path::{Path, PathBuf};

use ds_rimpull::RimpullCurve;
use ds_sim::SimResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::RunManifest;
use crate::{ResultsError, ResultsResult};

const MANIFEST: &str = "manifest.json";
const RESULT: &str = "result.json";
const RIMPULL: &str = "rimpull.json";

#[derive(Debug, Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store under `.drivesim/runs` next to a topology file.
    pub fn beside(topology_path: &Path) -> ResultsResult<Self> {
        let dir = topology_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::new(dir.join(".drivesim").join("runs"))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    pub fn has_result(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(RESULT).exists()
    }

    fn write_json<T: Serialize + ?Sized>(&self, run_id: &str, file: &str, value: &T) -> ResultsResult<()> {
        let dir = self.run_dir(run_id);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file), serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, run_id: &str, file: &str, what: &'static str) -> ResultsResult<T> {
        if !self.has_run(run_id) {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let path = self.run_dir(run_id).join(file);
        if !path.exists() {
            return Err(ResultsError::MissingArtifact {
                run_id: run_id.to_string(),
                what,
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save_run(&self, manifest: &RunManifest, result: &SimResult) -> ResultsResult<()> {
        self.write_json(&manifest.run_id, MANIFEST, manifest)?;
        self.write_json(&manifest.run_id, RESULT, result)?;
        debug!(run_id = %manifest.run_id, samples = result.len(), "run saved");
        Ok(())
    }

    pub fn save_rimpull(&self, manifest: &RunManifest, curves: &[RimpullCurve]) -> ResultsResult<()> {
        self.write_json(&manifest.run_id, MANIFEST, manifest)?;
        self.write_json(&manifest.run_id, RIMPULL, curves)?;
        debug!(run_id = %manifest.run_id, curves = curves.len(), "rimpull saved");
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        self.read_json(run_id, MANIFEST, "manifest")
    }

    pub fn load_result(&self, run_id: &str) -> ResultsResult<SimResult> {
        self.read_json(run_id, RESULT, "simulation result")
    }

    pub fn load_rimpull(&self, run_id: &str) -> ResultsResult<Vec<RimpullCurve>> {
        self.read_json(run_id, RIMPULL, "rimpull curves")
    }

    /// Manifests of every stored run, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }
        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.run_id.cmp(&b.run_id)));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
