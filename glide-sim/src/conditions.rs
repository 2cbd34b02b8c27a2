//! Per-flight weather and the distribution it is drawn from.
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DISTANCE_MAX_M, DEFAULT_LANDING_TIME_S, DEFAULT_SPACING_MAX_M, DEFAULT_SPACING_MEAN_M,
    DEFAULT_SPACING_MIN_M, DEFAULT_SPACING_STD_M, DEFAULT_TAKE_OFF_ALTITUDE_M,
    DEFAULT_TAKE_OFF_TIME_S, DEFAULT_THERMAL_CEILING_M, DISTRIBUTION_CLIMB_MAX_M_S,
    DISTRIBUTION_CLIMB_MIN_M_S, DISTRIBUTION_CLIMB_STD_RATIO, THERMAL_WIDTH_M,
};
use crate::error::{
    ConfigError, ensure_finite, ensure_non_negative, ensure_ordered, ensure_positive,
};
use crate::thermal::{Thermal, ThermalField};

/// Normal distribution clipped per sample into `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClippedNormal {
    pub min: f64,
    pub mean: f64,
    pub std: f64,
    pub max: f64,
}

impl ClippedNormal {
    #[must_use]
    pub const fn new(min: f64, mean: f64, std: f64, max: f64) -> Self {
        Self {
            min,
            mean,
            std,
            max,
        }
    }

    /// Check `min <= mean <= max` and `std >= 0`.
    ///
    /// # Errors
    ///
    /// Returns an error naming `field` when an invariant is violated.
    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        ensure_ordered(field, self.min, self.mean, self.max)?;
        ensure_non_negative(field, self.std)?;
        Ok(())
    }

    /// Draw one value; out-of-range draws are clipped, never rejected.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        z.mul_add(self.std, self.mean).clamp(self.min, self.max)
    }
}

/// Weather and deadlines for a single simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightConditions {
    pub take_off_time_s: f64,
    pub take_off_altitude_m: f64,
    pub landing_time_s: f64,
    pub distance_max_m: f64,
    pub thermal_ceiling_m: f64,
    pub thermal_climb: ClippedNormal,
    pub thermal_spacing: ClippedNormal,
}

impl FlightConditions {
    /// Validate and return the conditions.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Check every configuration invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("take_off_time_s", self.take_off_time_s)?;
        ensure_positive("take_off_altitude_m", self.take_off_altitude_m)?;
        ensure_finite("landing_time_s", self.landing_time_s)?;
        if self.landing_time_s <= self.take_off_time_s {
            return Err(ConfigError::LandingBeforeTakeOff {
                take_off: self.take_off_time_s,
                landing: self.landing_time_s,
            });
        }
        ensure_positive("distance_max_m", self.distance_max_m)?;
        ensure_positive("thermal_ceiling_m", self.thermal_ceiling_m)?;
        if self.take_off_altitude_m > self.thermal_ceiling_m {
            return Err(ConfigError::TakeOffAboveCeiling {
                take_off: self.take_off_altitude_m,
                ceiling: self.thermal_ceiling_m,
            });
        }
        self.thermal_climb.validate("thermal_climb")?;
        self.thermal_spacing.validate("thermal_spacing")?;
        ensure_non_negative("thermal_spacing.min", self.thermal_spacing.min)?;
        Ok(())
    }

    /// Sample the thermal following one that ended at `last_distance_end_m`.
    pub fn sample_thermal<R: Rng + ?Sized>(&self, rng: &mut R, last_distance_end_m: f64) -> Thermal {
        let distance_start_m = last_distance_end_m + self.thermal_spacing.sample(rng);
        let net_climb_m_s = self.thermal_climb.sample(rng);
        Thermal::new(
            distance_start_m,
            distance_start_m + THERMAL_WIDTH_M,
            net_climb_m_s,
        )
    }

    /// Sample thermals until one reaches `distance_max_m`; that one is kept.
    pub fn sample_thermals<R: Rng + ?Sized>(&self, rng: &mut R) -> ThermalField {
        let mut field = ThermalField::default();
        let mut last_end_m = 0.0;
        loop {
            let thermal = self.sample_thermal(rng, last_end_m);
            last_end_m = thermal.distance_end_m;
            field.push(thermal);
            if last_end_m >= self.distance_max_m {
                break;
            }
        }
        log::trace!(
            "sampled {} thermals over {:.0} m",
            field.len(),
            field.distance_end_m()
        );
        field
    }
}

impl Default for FlightConditions {
    fn default() -> Self {
        let climb_mean = 1.5;
        Self {
            take_off_time_s: DEFAULT_TAKE_OFF_TIME_S,
            take_off_altitude_m: DEFAULT_TAKE_OFF_ALTITUDE_M,
            landing_time_s: DEFAULT_LANDING_TIME_S,
            distance_max_m: DEFAULT_DISTANCE_MAX_M,
            thermal_ceiling_m: DEFAULT_THERMAL_CEILING_M,
            thermal_climb: ClippedNormal::new(
                DISTRIBUTION_CLIMB_MIN_M_S,
                climb_mean,
                climb_mean * DISTRIBUTION_CLIMB_STD_RATIO,
                DISTRIBUTION_CLIMB_MAX_M_S,
            ),
            thermal_spacing: ClippedNormal::new(
                DEFAULT_SPACING_MIN_M,
                DEFAULT_SPACING_MEAN_M,
                DEFAULT_SPACING_STD_M,
                DEFAULT_SPACING_MAX_M,
            ),
        }
    }
}

/// Distribution whose climb mean varies from flight to flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimbMeanRange {
    pub climb_mean_min_m_s: f64,
    pub climb_mean_max_m_s: f64,
    #[serde(default = "ClimbMeanRange::default_take_off_time_s")]
    pub take_off_time_s: f64,
    #[serde(default = "ClimbMeanRange::default_take_off_altitude_m")]
    pub take_off_altitude_m: f64,
    #[serde(default = "ClimbMeanRange::default_landing_time_s")]
    pub landing_time_s: f64,
    #[serde(default = "ClimbMeanRange::default_distance_max_m")]
    pub distance_max_m: f64,
    #[serde(default = "ClimbMeanRange::default_thermal_ceiling_m")]
    pub thermal_ceiling_m: f64,
    #[serde(default = "ClimbMeanRange::default_thermal_spacing")]
    pub thermal_spacing: ClippedNormal,
}

impl ClimbMeanRange {
    const fn default_take_off_time_s() -> f64 {
        DEFAULT_TAKE_OFF_TIME_S
    }

    const fn default_take_off_altitude_m() -> f64 {
        DEFAULT_TAKE_OFF_ALTITUDE_M
    }

    const fn default_landing_time_s() -> f64 {
        DEFAULT_LANDING_TIME_S
    }

    const fn default_distance_max_m() -> f64 {
        DEFAULT_DISTANCE_MAX_M
    }

    const fn default_thermal_ceiling_m() -> f64 {
        DEFAULT_THERMAL_CEILING_M
    }

    const fn default_thermal_spacing() -> ClippedNormal {
        ClippedNormal::new(
            DEFAULT_SPACING_MIN_M,
            DEFAULT_SPACING_MEAN_M,
            DEFAULT_SPACING_STD_M,
            DEFAULT_SPACING_MAX_M,
        )
    }

    /// Range with every other parameter at its default.
    #[must_use]
    pub const fn new(climb_mean_min_m_s: f64, climb_mean_max_m_s: f64) -> Self {
        Self {
            climb_mean_min_m_s,
            climb_mean_max_m_s,
            take_off_time_s: Self::default_take_off_time_s(),
            take_off_altitude_m: Self::default_take_off_altitude_m(),
            landing_time_s: Self::default_landing_time_s(),
            distance_max_m: Self::default_distance_max_m(),
            thermal_ceiling_m: Self::default_thermal_ceiling_m(),
            thermal_spacing: Self::default_thermal_spacing(),
        }
    }

    fn conditions_for_mean(&self, climb_mean_m_s: f64) -> FlightConditions {
        FlightConditions {
            take_off_time_s: self.take_off_time_s,
            take_off_altitude_m: self.take_off_altitude_m,
            landing_time_s: self.landing_time_s,
            distance_max_m: self.distance_max_m,
            thermal_ceiling_m: self.thermal_ceiling_m,
            thermal_climb: ClippedNormal::new(
                DISTRIBUTION_CLIMB_MIN_M_S,
                climb_mean_m_s,
                climb_mean_m_s * DISTRIBUTION_CLIMB_STD_RATIO,
                DISTRIBUTION_CLIMB_MAX_M_S,
            ),
            thermal_spacing: self.thermal_spacing,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("climb_mean_min_m_s", self.climb_mean_min_m_s)?;
        ensure_finite("climb_mean_max_m_s", self.climb_mean_max_m_s)?;
        if self.climb_mean_min_m_s > self.climb_mean_max_m_s {
            return Err(ConfigError::Range {
                field: "climb_mean",
                min: self.climb_mean_min_m_s,
                max: self.climb_mean_max_m_s,
            });
        }
        // Both ends of the range must produce valid conditions.
        self.conditions_for_mean(self.climb_mean_min_m_s).validate()?;
        self.conditions_for_mean(self.climb_mean_max_m_s).validate()
    }
}

/// Meta-distribution producing one `FlightConditions` per flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlightConditionsDistribution {
    /// Climb mean drawn uniformly per flight, std at half the mean.
    ClimbMeanRange(ClimbMeanRange),
    /// The same conditions for every flight.
    Fixed(FlightConditions),
}

impl FlightConditionsDistribution {
    /// Uniform climb-mean distribution with default route parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when the range is inverted or produces invalid
    /// conditions at either end.
    pub fn climb_mean_range(
        climb_mean_min_m_s: f64,
        climb_mean_max_m_s: f64,
    ) -> Result<Self, ConfigError> {
        Self::ClimbMeanRange(ClimbMeanRange::new(climb_mean_min_m_s, climb_mean_max_m_s))
            .validated()
    }

    /// Degenerate distribution holding weather fixed across a batch.
    ///
    /// # Errors
    ///
    /// Returns an error when `conditions` violates an invariant.
    pub fn fixed(conditions: FlightConditions) -> Result<Self, ConfigError> {
        Self::Fixed(conditions).validated()
    }

    /// Validate and return the distribution.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Check the distribution parameters.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::ClimbMeanRange(range) => range.validate(),
            Self::Fixed(conditions) => conditions.validate(),
        }
    }

    /// Draw the conditions for one flight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> FlightConditions {
        match self {
            Self::ClimbMeanRange(range) => {
                let climb_mean_m_s =
                    rng.gen_range(range.climb_mean_min_m_s..=range.climb_mean_max_m_s);
                range.conditions_for_mean(climb_mean_m_s)
            }
            Self::Fixed(conditions) => conditions.clone(),
        }
    }
}

impl Default for FlightConditionsDistribution {
    fn default() -> Self {
        Self::ClimbMeanRange(ClimbMeanRange::new(0.5, 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn clipped_normal_stays_in_bounds() {
        let dist = ClippedNormal::new(1.0, 2.0, 10.0, 3.0);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = dist.sample(&mut rng);
            assert!((1.0..=3.0).contains(&v), "{v} escaped the clip range");
        }
    }

    #[test]
    fn zero_std_is_deterministic() {
        let dist = ClippedNormal::new(0.0, 2.5, 0.0, 5.0);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!((dist.sample(&mut rng) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inverted_climb_bounds() {
        let mut conditions = FlightConditions::default();
        conditions.thermal_climb.min = 4.0;
        assert!(matches!(
            conditions.validated(),
            Err(ConfigError::Bounds {
                field: "thermal_climb",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_positive_distance_max() {
        let conditions = FlightConditions {
            distance_max_m: 0.0,
            ..FlightConditions::default()
        };
        assert!(matches!(
            conditions.validate(),
            Err(ConfigError::NotPositive {
                field: "distance_max_m",
                ..
            })
        ));
    }

    #[test]
    fn rejects_take_off_above_ceiling() {
        let conditions = FlightConditions {
            take_off_altitude_m: 4500.0,
            thermal_ceiling_m: 4000.0,
            ..FlightConditions::default()
        };
        assert!(matches!(
            conditions.validate(),
            Err(ConfigError::TakeOffAboveCeiling { .. })
        ));
        let at_ceiling = FlightConditions {
            take_off_altitude_m: 4000.0,
            ..conditions
        };
        assert!(at_ceiling.validate().is_ok());
    }

    #[test]
    fn rejects_landing_before_take_off() {
        let conditions = FlightConditions {
            take_off_time_s: 100.0,
            landing_time_s: 100.0,
            ..FlightConditions::default()
        };
        assert!(matches!(
            conditions.validate(),
            Err(ConfigError::LandingBeforeTakeOff { .. })
        ));
    }

    #[test]
    fn first_thermal_starts_after_origin() {
        let conditions = FlightConditions::default();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let field = conditions.sample_thermals(&mut rng);
        let first = field.get(0).copied().unwrap_or(Thermal::new(0.0, 0.0, 0.0));
        assert!(first.distance_start_m >= conditions.thermal_spacing.min);
        assert!((first.width_m() - THERMAL_WIDTH_M).abs() < 1e-9);
    }

    #[test]
    fn field_covers_distance_max_with_single_overrun() {
        let conditions = FlightConditions {
            distance_max_m: 50_000.0,
            ..FlightConditions::default()
        };
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let field = conditions.sample_thermals(&mut rng);
        assert!(field.is_well_ordered());
        assert!(field.distance_end_m() >= conditions.distance_max_m);
        let before_last = &field.as_slice()[..field.len() - 1];
        assert!(
            before_last
                .iter()
                .all(|t| t.distance_end_m < conditions.distance_max_m)
        );
    }

    #[test]
    fn tiny_route_still_has_one_thermal() {
        let conditions = FlightConditions {
            distance_max_m: 1.0,
            ..FlightConditions::default()
        };
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        assert_eq!(conditions.sample_thermals(&mut rng).len(), 1);
    }

    #[test]
    fn climb_mean_range_sets_std_to_half_mean() {
        let dist = FlightConditionsDistribution::climb_mean_range(1.0, 2.0).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        for _ in 0..100 {
            let conditions = dist.sample(&mut rng);
            let climb = conditions.thermal_climb;
            assert!((1.0..=2.0).contains(&climb.mean));
            assert!((climb.std - climb.mean * 0.5).abs() < 1e-12);
            assert!((climb.min - DISTRIBUTION_CLIMB_MIN_M_S).abs() < f64::EPSILON);
            assert!((climb.max - DISTRIBUTION_CLIMB_MAX_M_S).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn climb_mean_range_rejects_inverted_range() {
        assert!(matches!(
            FlightConditionsDistribution::climb_mean_range(3.0, 1.0),
            Err(ConfigError::Range { .. })
        ));
        // A mean below the fixed climb floor cannot produce valid conditions.
        assert!(matches!(
            FlightConditionsDistribution::climb_mean_range(0.1, 1.0),
            Err(ConfigError::Bounds { .. })
        ));
    }

    #[test]
    fn distribution_json_uses_kind_tag() {
        let dist = FlightConditionsDistribution::default();
        let json = serde_json::to_string(&dist).unwrap();
        assert!(json.contains("\"kind\":\"climb_mean_range\""));
        let back: FlightConditionsDistribution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dist);
    }
}
