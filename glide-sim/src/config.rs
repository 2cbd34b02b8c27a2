//! Simulation configuration loaded from JSON.
use serde::{Deserialize, Serialize};

use crate::aircraft::AircraftModel;
use crate::conditions::FlightConditionsDistribution;
use crate::constants::DEFAULT_CLIMB_STEP_S;
use crate::error::{ConfigError, ensure_positive};

const DEFAULT_SIMULATION_DATA: &str = include_str!("../assets/default_simulation.json");

/// Distribution, aircraft and integrator settings shared by a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub distribution: FlightConditionsDistribution,
    #[serde(default)]
    pub aircraft: AircraftModel,
    #[serde(default = "default_climb_step_s")]
    pub climb_step_s: f64,
}

const fn default_climb_step_s() -> f64 {
    DEFAULT_CLIMB_STEP_S
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            distribution: FlightConditionsDistribution::default(),
            aircraft: AircraftModel::default(),
            climb_step_s: DEFAULT_CLIMB_STEP_S,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON string cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first violated invariant of the distribution, the aircraft
    /// or the climb step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.distribution.validate()?;
        self.aircraft.validate()?;
        ensure_positive("climb_step_s", self.climb_step_s)?;
        Ok(())
    }

    /// Embedded default configuration.
    #[must_use]
    pub fn default_config() -> Self {
        Self::from_json(DEFAULT_SIMULATION_DATA).unwrap_or_else(|err| {
            log::warn!("embedded simulation config rejected: {err}");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_matches_defaults() {
        assert_eq!(SimulationConfig::default_config(), SimulationConfig::default());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn rejects_non_positive_distance() {
        let json = r#"{
            "distribution": {
                "kind": "climb_mean_range",
                "climb_mean_min_m_s": 1.0,
                "climb_mean_max_m_s": 2.0,
                "distance_max_m": 0.0
            }
        }"#;
        assert!(matches!(
            SimulationConfig::from_json(json),
            Err(ConfigError::NotPositive {
                field: "distance_max_m",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_climb_step_and_json() {
        assert!(matches!(
            SimulationConfig::from_json(r#"{"climb_step_s": 0.0}"#),
            Err(ConfigError::NotPositive {
                field: "climb_step_s",
                ..
            })
        ));
        assert!(matches!(
            SimulationConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
