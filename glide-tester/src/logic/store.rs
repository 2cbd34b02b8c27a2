//! On-disk cache of simulated batches keyed by experiment hash.
use std::fs;
use std::path::{Path, PathBuf};

use glide_sim::{ConfigError, ExperimentInput, ExperimentOutputBatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot derive cache key: {0}")]
    Key(#[from] ConfigError),
    #[error("cached file {0} belongs to a different experiment")]
    Mismatch(PathBuf),
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredExperiment {
    input: ExperimentInput,
    batch: ExperimentOutputBatch,
}

/// Directory of `<cache key>.json` files, one per experiment input.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    /// Open `root`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// # Errors
    ///
    /// Returns an error when the input cannot be hashed.
    pub fn path_for(&self, input: &ExperimentInput) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(format!("{}.json", input.cache_key()?)))
    }

    /// Load the batch stored for `input`, `None` when nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns an error when the cached file is unreadable, malformed or was
    /// written for a different input.
    pub fn load(&self, input: &ExperimentInput) -> Result<Option<ExperimentOutputBatch>, StoreError> {
        let path = self.path_for(input)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let stored: StoredExperiment = serde_json::from_str(&json)?;
        if stored.input != *input {
            return Err(StoreError::Mismatch(path));
        }
        log::debug!("loaded {} flights from {}", stored.batch.len(), path.display());
        Ok(Some(stored.batch))
    }

    /// Write `batch` under the key of `input`.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    pub fn save(
        &self,
        input: &ExperimentInput,
        batch: &ExperimentOutputBatch,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path_for(input)?;
        let stored = StoredExperiment {
            input: input.clone(),
            batch: batch.clone(),
        };
        let json = serde_json::to_string(&stored)?;
        fs::write(&path, json).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("cached {} flights at {}", batch.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glide_sim::{AircraftModel, FlightConditionsDistribution, NeverThermal, Simulator};

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "glide-store-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn input(seed: u64) -> ExperimentInput {
        ExperimentInput {
            distribution: FlightConditionsDistribution::default(),
            aircraft: AircraftModel::default(),
            policy: "never".to_string(),
            policy_fingerprint: None,
            seed,
            flight_count: 3,
            climb_step_s: 10.0,
        }
    }

    #[test]
    fn save_then_load_returns_same_batch() {
        let store = ResultStore::open(temp_dir("roundtrip")).unwrap();
        let simulator = Simulator::new(
            FlightConditionsDistribution::default(),
            AircraftModel::default(),
        )
        .unwrap();
        let batch = simulator.simulate_batch(&NeverThermal, 3, 1).unwrap();
        assert!(store.load(&input(1)).unwrap().is_none());
        let path = store.save(&input(1), &batch).unwrap();
        assert!(path.starts_with(store.root()));
        assert_eq!(store.load(&input(1)).unwrap(), Some(batch));
        assert!(store.load(&input(2)).unwrap().is_none());
        let _ = fs::remove_dir_all(store.root());
    }

    #[test]
    fn detects_foreign_file_under_key() {
        let store = ResultStore::open(temp_dir("mismatch")).unwrap();
        let path = store.path_for(&input(1)).unwrap();
        let foreign = StoredExperiment {
            input: input(9),
            batch: ExperimentOutputBatch::default(),
        };
        fs::write(&path, serde_json::to_string(&foreign).unwrap()).unwrap();
        assert!(matches!(
            store.load(&input(1)),
            Err(StoreError::Mismatch(_))
        ));
        let _ = fs::remove_dir_all(store.root());
    }
}
