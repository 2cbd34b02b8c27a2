//! Static glider performance.
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SINK_MAX_M_S, DEFAULT_VELOCITY_MAX_M_S};
use crate::error::{ConfigError, ensure_finite, ensure_positive};

/// Cruise performance consumed by the integrator.
///
/// `sink_max_m_s` is a vertical speed and therefore negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftModel {
    pub velocity_max_m_s: f64,
    pub sink_max_m_s: f64,
}

impl AircraftModel {
    /// Build a validated aircraft model.
    ///
    /// # Errors
    ///
    /// Returns an error when the cruise speed is not positive or the sink rate
    /// is not negative.
    pub fn new(velocity_max_m_s: f64, sink_max_m_s: f64) -> Result<Self, ConfigError> {
        let model = Self {
            velocity_max_m_s,
            sink_max_m_s,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check the model invariants.
    ///
    /// # Errors
    ///
    /// Returns an error when the cruise speed is not positive or the sink rate
    /// is not negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("velocity_max_m_s", self.velocity_max_m_s)?;
        ensure_finite("sink_max_m_s", self.sink_max_m_s)?;
        if self.sink_max_m_s >= 0.0 {
            return Err(ConfigError::NotNegative {
                field: "sink_max_m_s",
                value: self.sink_max_m_s,
            });
        }
        Ok(())
    }

    /// Distance covered per meter of altitude lost while cruising.
    #[must_use]
    pub fn glide_ratio(&self) -> f64 {
        self.velocity_max_m_s / -self.sink_max_m_s
    }

    /// Seconds of cruise until `altitude_m` is used up.
    #[must_use]
    pub fn time_to_ground_s(&self, altitude_m: f64) -> f64 {
        altitude_m.max(0.0) / -self.sink_max_m_s
    }
}

impl Default for AircraftModel {
    fn default() -> Self {
        Self {
            velocity_max_m_s: DEFAULT_VELOCITY_MAX_M_S,
            sink_max_m_s: DEFAULT_SINK_MAX_M_S,
        }
    }
}
