//! Centralized model constants for the flight simulation.
//!
//! These values pin down the deterministic math of the integrator and the
//! reference policies. Per-flight weather lives in `FlightConditions`; only
//! values that are part of the model itself belong here.

// Thermal geometry ---------------------------------------------------------
/// Horizontal width of every sampled thermal.
pub const THERMAL_WIDTH_M: f64 = 200.0;

// Integrator -----------------------------------------------------------------
/// Duration of the probe node exposing a thermal's climb to the policy.
pub const PROBE_DURATION_S: f64 = 1.0;
/// Default time step of the climb phase.
pub const DEFAULT_CLIMB_STEP_S: f64 = 10.0;

// Distribution defaults ------------------------------------------------------
pub const DEFAULT_TAKE_OFF_TIME_S: f64 = 0.0;
pub const DEFAULT_TAKE_OFF_ALTITUDE_M: f64 = 1000.0;
pub const DEFAULT_LANDING_TIME_S: f64 = 3600.0 * 6.0;
pub const DEFAULT_DISTANCE_MAX_M: f64 = 3600.0 * 6.0 * 10.0;
pub const DEFAULT_THERMAL_CEILING_M: f64 = 4000.0;
pub const DEFAULT_SPACING_MIN_M: f64 = 1000.0;
pub const DEFAULT_SPACING_MEAN_M: f64 = 2000.0;
pub const DEFAULT_SPACING_STD_M: f64 = 1000.0;
pub const DEFAULT_SPACING_MAX_M: f64 = 10000.0;
/// Weakest climb that still counts as a thermal.
pub const DISTRIBUTION_CLIMB_MIN_M_S: f64 = 0.2;
pub const DISTRIBUTION_CLIMB_MAX_M_S: f64 = 10.0;
/// Climb std as a fraction of the sampled climb mean.
pub const DISTRIBUTION_CLIMB_STD_RATIO: f64 = 0.5;

// Aircraft defaults ----------------------------------------------------------
pub const DEFAULT_VELOCITY_MAX_M_S: f64 = 10.0;
pub const DEFAULT_SINK_MAX_M_S: f64 = -1.0;

// Three-zone policy ----------------------------------------------------------
/// Above this fraction of takeoff altitude the glider is in the progress zone.
pub const PROGRESS_ZONE_FRACTION: f64 = 0.66;
/// Above this fraction (and below progress) the glider is in the lift zone.
pub const LIFT_ZONE_FRACTION: f64 = 0.33;
/// Thermals climbed before the zone thresholds are trusted.
pub const EXPLORE_THERMAL_COUNT: usize = 2;

// Learned policy ---------------------------------------------------------------
pub const FEATURE_DECILES: usize = 10;
/// Deciles, normalized altitude, current lift, normalized time, use flag.
pub const FEATURE_COUNT: usize = FEATURE_DECILES + 4;
/// Elapsed time normalizer for features (six hours).
pub const FEATURE_MAX_TIME_S: f64 = 21_600.0;
/// Lift below which the learned policy never considers climbing.
pub const LEARNED_MIN_LIFT_M_S: f64 = 0.01;
pub const DEFAULT_HIDDEN_SIZES: [usize; 2] = [64, 32];
