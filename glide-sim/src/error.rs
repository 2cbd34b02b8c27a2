//! Error types raised by the flight engine.
use thiserror::Error;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be finite (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be greater than zero (got {value:.3})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be less than zero (got {value:.3})")]
    NotNegative { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value:.3})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} bounds invalid: min {min:.3} <= mean {mean:.3} <= max {max:.3} does not hold")]
    Bounds {
        field: &'static str,
        min: f64,
        mean: f64,
        max: f64,
    },
    #[error("{field} range invalid (min {min:.3} > max {max:.3})")]
    Range {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("landing time {landing:.1}s must be after takeoff time {take_off:.1}s")]
    LandingBeforeTakeOff { take_off: f64, landing: f64 },
    #[error("take-off altitude {take_off:.1}m is above the thermal ceiling {ceiling:.1}m")]
    TakeOffAboveCeiling { take_off: f64, ceiling: f64 },
    #[error("thermal field is not ordered at thermal {index}")]
    UnorderedThermals { index: usize },
    #[error("JSON parse error: {0}")]
    Json(String),
}

/// Errors that abort a single simulated flight.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FlightError {
    #[error("zero time step between nodes {index} and {next} at t={time_s:.3}s")]
    ZeroTimeStep {
        index: usize,
        next: usize,
        time_s: f64,
    },
    #[error("policy '{policy}' failed: {reason}")]
    Policy { policy: String, reason: String },
    #[error("invalid flight conditions: {0}")]
    Conditions(#[from] ConfigError),
}

/// Errors raised while building or loading a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("unknown policy '{0}'")]
    Unknown(String),
    #[error("invalid policy parameter '{value}' for {policy}: {reason}")]
    Parameter {
        policy: &'static str,
        value: String,
        reason: String,
    },
    #[error("network layer {layer} expects {expected} inputs but receives {actual}")]
    LayerShape {
        layer: usize,
        expected: usize,
        actual: usize,
    },
    #[error("network must end in a single output (got {0})")]
    OutputShape(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience wrapper used by the batch runner.
pub type FlightResult<T> = Result<T, FlightError>;

/// Ensure a value is finite, tagging the failing field.
///
/// # Errors
///
/// Returns [`ConfigError::NotFinite`] for NaN or infinite input.
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

/// Ensure a value is strictly positive.
///
/// # Errors
///
/// Returns an error when the value is not finite or not above zero.
pub fn ensure_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Ensure a value is zero or above.
///
/// # Errors
///
/// Returns an error when the value is not finite or below zero.
pub fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    ensure_finite(field, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Ensure `min <= mean <= max`.
///
/// # Errors
///
/// Returns [`ConfigError::Bounds`] when the ordering does not hold.
pub fn ensure_ordered(
    field: &'static str,
    min: f64,
    mean: f64,
    max: f64,
) -> Result<(), ConfigError> {
    ensure_finite(field, min)?;
    ensure_finite(field, mean)?;
    ensure_finite(field, max)?;
    if min <= mean && mean <= max {
        Ok(())
    } else {
        Err(ConfigError::Bounds {
            field,
            min,
            mean,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_bounds_reject_inverted_range() {
        assert!(ensure_ordered("climb", 0.2, 1.0, 5.0).is_ok());
        let err = ensure_ordered("climb", 3.0, 1.0, 5.0).unwrap_err();
        assert!(matches!(err, ConfigError::Bounds { field: "climb", .. }));
        assert!(err.to_string().contains("climb bounds invalid"));
    }

    #[test]
    fn positivity_checks_reject_nan() {
        assert!(matches!(
            ensure_positive("speed", f64::NAN),
            Err(ConfigError::NotFinite { .. })
        ));
        assert!(matches!(
            ensure_positive("speed", 0.0),
            Err(ConfigError::NotPositive { .. })
        ));
        assert!(ensure_non_negative("std", 0.0).is_ok());
    }

    #[test]
    fn flight_errors_clone_with_their_source() {
        let err = FlightError::from(ConfigError::UnorderedThermals { index: 2 });
        let copy = err.clone();
        assert_eq!(copy, err);
        assert!(copy.to_string().contains("not ordered at thermal 2"));
    }
}
