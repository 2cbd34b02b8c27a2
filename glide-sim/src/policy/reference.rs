//! Hand-written reference policies.
use crate::aircraft::AircraftModel;
use crate::constants::{EXPLORE_THERMAL_COUNT, LIFT_ZONE_FRACTION, PROGRESS_ZONE_FRACTION};
use crate::error::{FlightError, PolicyError};
use crate::stats::quantile;

use super::{DecisionContext, FlightPolicy};

/// Never stops to climb; the baseline for every comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverThermal;

impl FlightPolicy for NeverThermal {
    fn name(&self) -> &str {
        "never_thermal"
    }

    fn use_thermal(
        &self,
        _flight: &DecisionContext<'_>,
        _aircraft: &AircraftModel,
    ) -> Result<bool, FlightError> {
        Ok(false)
    }
}

/// Climbs in every thermal that actually lifts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysThermal;

impl FlightPolicy for AlwaysThermal {
    fn name(&self) -> &str {
        "always_thermal"
    }

    fn use_thermal(
        &self,
        flight: &DecisionContext<'_>,
        _aircraft: &AircraftModel,
    ) -> Result<bool, FlightError> {
        Ok(flight.current_climb_m_s()? > 0.0)
    }
}

/// Altitude-banded selectivity.
///
/// High up the glider only takes thermals stronger than the
/// `progress_quantile` of the thermals met so far; in the middle band the
/// bar drops to `lift_quantile`; low down every rising thermal is taken.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreeZones {
    progress_quantile: f64,
    lift_quantile: f64,
    name: String,
}

impl ThreeZones {
    /// # Errors
    ///
    /// Returns an error when either quantile lies outside `[0, 1]`.
    pub fn new(progress_quantile: f64, lift_quantile: f64) -> Result<Self, PolicyError> {
        for q in [progress_quantile, lift_quantile] {
            if !(0.0..=1.0).contains(&q) {
                return Err(PolicyError::Parameter {
                    policy: "three-zones",
                    value: q.to_string(),
                    reason: "quantile must lie in [0, 1]".to_string(),
                });
            }
        }
        Ok(Self {
            progress_quantile,
            lift_quantile,
            name: format!("three_zones({progress_quantile},{lift_quantile})"),
        })
    }

    #[must_use]
    pub const fn progress_quantile(&self) -> f64 {
        self.progress_quantile
    }

    #[must_use]
    pub const fn lift_quantile(&self) -> f64 {
        self.lift_quantile
    }
}

impl FlightPolicy for ThreeZones {
    fn name(&self) -> &str {
        &self.name
    }

    fn use_thermal(
        &self,
        flight: &DecisionContext<'_>,
        _aircraft: &AircraftModel,
    ) -> Result<bool, FlightError> {
        let climb = flight.current_climb_m_s()?;
        if climb <= 0.0 {
            return Ok(false);
        }
        let past = flight.thermal_climbs();
        if past.len() < EXPLORE_THERMAL_COUNT {
            return Ok(true);
        }

        let altitude = flight.last_node().altitude_m;
        let take_off = flight.take_off_altitude_m();
        let threshold_q = if altitude > PROGRESS_ZONE_FRACTION * take_off {
            self.progress_quantile
        } else if altitude > LIFT_ZONE_FRACTION * take_off {
            self.lift_quantile
        } else {
            return Ok(true);
        };
        Ok(quantile(&past, threshold_q).is_none_or(|threshold| climb > threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climbs::ClimbSummarizer;
    use crate::flight::FlightState;
    use crate::flight::tests::flight_from;

    fn decide(policy: &dyn FlightPolicy, flight: &FlightState) -> bool {
        let mut climbs = ClimbSummarizer::new();
        climbs.sync(flight);
        policy
            .use_thermal(
                &DecisionContext::new(flight, &climbs),
                &AircraftModel::default(),
            )
            .unwrap()
    }

    /// Two closed thermals of 1 and 3 m/s, then a probe of `probe` m/s ending
    /// at `altitude`.
    fn experienced(altitude: f64, probe: f64) -> FlightState {
        flight_from(&[
            (0.0, 1000.0),
            (10.0, 1010.0),
            (20.0, 1000.0),
            (30.0, 1030.0),
            (100.0, altitude - probe),
            (101.0, altitude),
        ])
    }

    #[test]
    fn never_declines_lift() {
        let flight = flight_from(&[(0.0, 1000.0), (100.0, 900.0), (101.0, 905.0)]);
        assert!(!decide(&NeverThermal, &flight));
    }

    #[test]
    fn always_follows_last_step() {
        let rising = flight_from(&[(0.0, 1000.0), (100.0, 900.0), (101.0, 901.0)]);
        let sinking = flight_from(&[(0.0, 1000.0), (100.0, 900.0)]);
        assert!(decide(&AlwaysThermal, &rising));
        assert!(!decide(&AlwaysThermal, &sinking));
    }

    #[test]
    fn always_propagates_zero_time_step() {
        let flight = flight_from(&[(0.0, 1000.0), (0.0, 1001.0)]);
        let climbs = ClimbSummarizer::new();
        let result = AlwaysThermal.use_thermal(
            &DecisionContext::new(&flight, &climbs),
            &AircraftModel::default(),
        );
        assert!(matches!(result, Err(FlightError::ZeroTimeStep { .. })));
    }

    #[test]
    fn three_zones_explores_first_thermals() {
        let policy = ThreeZones::new(1.0, 1.0).unwrap();
        let flight = flight_from(&[(0.0, 1000.0), (100.0, 900.0), (101.0, 900.1)]);
        assert!(decide(&policy, &flight));
    }

    #[test]
    fn three_zones_rejects_sink() {
        let policy = ThreeZones::new(0.0, 0.0).unwrap();
        let flight = flight_from(&[(0.0, 1000.0), (100.0, 900.0), (101.0, 899.0)]);
        assert!(!decide(&policy, &flight));
    }

    #[test]
    fn three_zones_uses_altitude_bands() {
        let policy = ThreeZones::new(0.9, 0.1).unwrap();
        // Past thermals: 1 and 3 m/s. q90 = 2.8, q10 = 1.2.
        assert!(!decide(&policy, &experienced(800.0, 2.0)));
        assert!(decide(&policy, &experienced(800.0, 2.9)));
        assert!(decide(&policy, &experienced(500.0, 2.0)));
        assert!(!decide(&policy, &experienced(500.0, 1.1)));
        assert!(decide(&policy, &experienced(200.0, 0.5)));
    }

    #[test]
    fn three_zones_rejects_bad_quantiles() {
        assert!(ThreeZones::new(-0.1, 0.5).is_err());
        assert!(ThreeZones::new(0.5, 1.01).is_err());
        assert_eq!(ThreeZones::new(0.7, 0.3).unwrap().name(), "three_zones(0.7,0.3)");
    }
}
