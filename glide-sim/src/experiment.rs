//! Experiment descriptions and result records.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::aircraft::AircraftModel;
use crate::conditions::{FlightConditions, FlightConditionsDistribution};
use crate::error::ConfigError;
use crate::flight::FlightState;
use crate::thermal::ThermalField;

/// Everything needed to reproduce a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInput {
    pub distribution: FlightConditionsDistribution,
    pub aircraft: AircraftModel,
    pub policy: String,
    /// Digest of loaded policy state; absent for policies named in full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_fingerprint: Option<String>,
    pub seed: u64,
    pub flight_count: usize,
    pub climb_step_s: f64,
}

impl ExperimentInput {
    /// Stable hex SHA-256 of the serialized input, used as a cache key.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be serialized.
    pub fn cache_key(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self).map_err(|e| ConfigError::Json(e.to_string()))?;
        let digest = Sha256::digest(json.as_bytes());
        Ok(format!("{digest:x}"))
    }
}

/// Result of one simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutput {
    pub flight_state: FlightState,
    #[serde(alias = "termals")]
    pub thermals: ThermalField,
    pub aircraft_model: AircraftModel,
    pub flight_conditions: FlightConditions,
    pub policy_name: String,
}

/// Outputs of a batch in simulation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutputBatch {
    #[serde(alias = "list_experiment_outputs")]
    pub outputs: Vec<ExperimentOutput>,
}

impl ExperimentOutputBatch {
    #[must_use]
    pub fn new(outputs: Vec<ExperimentOutput>) -> Self {
        Self { outputs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExperimentOutput> {
        self.outputs.iter()
    }

    #[must_use]
    pub fn final_distances_m(&self) -> Vec<f64> {
        self.iter()
            .map(|o| o.flight_state.final_distance_m())
            .collect()
    }

    /// Parse a batch document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] when the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] when serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::Json(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a ExperimentOutputBatch {
    type Item = &'a ExperimentOutput;
    type IntoIter = std::slice::Iter<'a, ExperimentOutput>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}
