//! Time-stepped flight integration and Monte Carlo batches.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::aircraft::AircraftModel;
use crate::climbs::ClimbSummarizer;
use crate::conditions::{FlightConditions, FlightConditionsDistribution};
use crate::config::SimulationConfig;
use crate::constants::{DEFAULT_CLIMB_STEP_S, PROBE_DURATION_S};
use crate::error::{ConfigError, FlightError, FlightResult, ensure_positive};
use crate::experiment::{ExperimentOutput, ExperimentOutputBatch};
use crate::flight::{FlightNode, FlightState, FlightStatus};
use crate::policy::{DecisionContext, FlightPolicy};
use crate::thermal::{Thermal, ThermalField};

/// A flight that failed inside a lenient batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightFailure {
    pub index: usize,
    pub error: FlightError,
}

/// Successful outputs plus the flights that failed, both in flight order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LenientBatch {
    pub batch: ExperimentOutputBatch,
    pub failures: Vec<FlightFailure>,
}

/// Runs flights drawn from a distribution for a fixed aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulator {
    distribution: FlightConditionsDistribution,
    aircraft: AircraftModel,
    climb_step_s: f64,
    parallel: bool,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns an error when the distribution or the aircraft is invalid.
    pub fn new(
        distribution: FlightConditionsDistribution,
        aircraft: AircraftModel,
    ) -> Result<Self, ConfigError> {
        distribution.validate()?;
        aircraft.validate()?;
        Ok(Self {
            distribution,
            aircraft,
            climb_step_s: DEFAULT_CLIMB_STEP_S,
            parallel: true,
        })
    }

    /// # Errors
    ///
    /// Returns an error when the configuration does not validate.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(config.distribution.clone(), config.aircraft)?.with_climb_step(config.climb_step_s)
    }

    /// # Errors
    ///
    /// Returns an error unless `climb_step_s` is positive.
    pub fn with_climb_step(mut self, climb_step_s: f64) -> Result<Self, ConfigError> {
        self.climb_step_s = ensure_positive("climb_step_s", climb_step_s)?;
        Ok(self)
    }

    /// Run batch flights on the rayon pool (default) or on the calling thread.
    #[must_use]
    pub const fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub const fn aircraft(&self) -> &AircraftModel {
        &self.aircraft
    }

    #[must_use]
    pub const fn distribution(&self) -> &FlightConditionsDistribution {
        &self.distribution
    }

    #[must_use]
    pub const fn climb_step_s(&self) -> f64 {
        self.climb_step_s
    }

    /// Random stream owned by flight `index` of the batch seeded with `seed`.
    #[must_use]
    pub fn flight_rng(seed: u64, index: usize) -> ChaCha20Rng {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(u64::try_from(index).unwrap_or(u64::MAX));
        rng
    }

    /// Draw conditions and a thermal field from `rng`, then fly them.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the flight.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        policy: &dyn FlightPolicy,
        rng: &mut R,
    ) -> FlightResult<ExperimentOutput> {
        let conditions = self.distribution.sample(rng);
        let thermals = conditions.sample_thermals(rng);
        self.simulate_field(&conditions, thermals, policy)
    }

    /// Fly flight `index` of the batch seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the flight.
    pub fn simulate_indexed(
        &self,
        policy: &dyn FlightPolicy,
        seed: u64,
        index: usize,
    ) -> FlightResult<ExperimentOutput> {
        let mut rng = Self::flight_rng(seed, index);
        self.simulate(policy, &mut rng).inspect_err(|err| {
            log::warn!("flight {index} ({}) aborted: {err}", policy.name());
        })
    }

    /// Fly one flight through a given thermal field.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::Conditions`] for invalid conditions or an
    /// unordered field and propagates policy failures.
    pub fn simulate_field(
        &self,
        conditions: &FlightConditions,
        thermals: ThermalField,
        policy: &dyn FlightPolicy,
    ) -> FlightResult<ExperimentOutput> {
        conditions.validate()?;
        if let Some(index) = thermals.first_disorder() {
            return Err(ConfigError::UnorderedThermals { index }.into());
        }
        let flight = self.fly(conditions, &thermals, policy)?;
        log::debug!(
            "{} flew {:.0} m in {:.0} s ({}, {} thermals)",
            policy.name(),
            flight.final_distance_m(),
            flight.duration_s(),
            flight.status(),
            flight.thermals_used()
        );
        Ok(ExperimentOutput {
            flight_state: flight,
            thermals,
            aircraft_model: self.aircraft,
            flight_conditions: conditions.clone(),
            policy_name: policy.name().to_string(),
        })
    }

    fn fly(
        &self,
        conditions: &FlightConditions,
        thermals: &ThermalField,
        policy: &dyn FlightPolicy,
    ) -> FlightResult<FlightState> {
        let landing_s = conditions.landing_time_s;
        let mut flight = FlightState::new(conditions.take_off_time_s, conditions.take_off_altitude_m);
        let mut climbs = ClimbSummarizer::new();

        for (index, thermal) in thermals.iter().enumerate() {
            self.cruise_to(&mut flight, thermal.distance_center_m(), landing_s);
            if !flight.is_flying() || !Self::probe(&mut flight, thermal, conditions) {
                break;
            }

            climbs.sync(&flight);
            let context = DecisionContext::new(&flight, &climbs);
            let use_thermal = policy.use_thermal(&context, &self.aircraft)?;
            log::trace!(
                "thermal {index} at {:.0} m ({:.2} m/s): use={use_thermal}",
                thermal.distance_start_m,
                thermal.net_climb_m_s
            );

            if use_thermal {
                flight.mark_last_thermal();
                self.climb(&mut flight, thermal, conditions);
            } else {
                // The policy still felt this thermal.
                climbs.record_declined(&flight);
                flight.retract_last();
            }
            if !flight.is_flying() {
                break;
            }
        }

        if flight.is_flying() {
            self.glide_to_landing(&mut flight, landing_s);
        }
        Ok(flight)
    }

    /// Cruise toward `target_m`, stopping early at the deadline or the ground.
    fn cruise_to(&self, flight: &mut FlightState, target_m: f64, landing_s: f64) {
        let last = flight.last_node();
        if last.time_s >= landing_s {
            flight.finish(FlightStatus::OutOfTime);
            return;
        }
        if last.altitude_m <= 0.0 {
            flight.finish(FlightStatus::OutOfAltitude);
            return;
        }
        let mut dt = (target_m - last.distance_m) / self.aircraft.velocity_max_m_s;
        if dt <= 0.0 {
            return;
        }

        let time_clipped = last.time_s + dt >= landing_s;
        if time_clipped {
            dt = landing_s - last.time_s;
        }
        // The deadline wins a tie with the ground.
        let ground_s = self.aircraft.time_to_ground_s(last.altitude_m);
        let grounded = if time_clipped {
            ground_s < dt
        } else {
            ground_s <= dt
        };

        let mut altitude_m = last.altitude_m + self.aircraft.sink_max_m_s * dt;
        if grounded {
            dt = ground_s;
            altitude_m = 0.0;
        }
        flight.push_node(FlightNode {
            time_s: last.time_s + dt,
            altitude_m,
            distance_m: last.distance_m + self.aircraft.velocity_max_m_s * dt,
            use_thermal: false,
        });
        if grounded {
            flight.finish(FlightStatus::OutOfAltitude);
        } else if time_clipped {
            flight.finish(FlightStatus::OutOfTime);
        }
    }

    /// Sample the thermal for up to one second so the policy can feel it.
    /// Returns `false` when no time is left for a probe.
    ///
    /// The probe altitude stays between the ground and the ceiling.
    fn probe(flight: &mut FlightState, thermal: &Thermal, conditions: &FlightConditions) -> bool {
        let last = flight.last_node();
        let dt = PROBE_DURATION_S.min(conditions.landing_time_s - last.time_s);
        if dt <= 0.0 {
            flight.finish(FlightStatus::OutOfTime);
            return false;
        }
        flight.push_node(FlightNode {
            time_s: last.time_s + dt,
            altitude_m: (last.altitude_m + thermal.net_climb_m_s * dt)
                .clamp(0.0, conditions.thermal_ceiling_m),
            distance_m: last.distance_m,
            use_thermal: false,
        });
        true
    }

    /// Climb in place until the ceiling or the deadline.
    fn climb(&self, flight: &mut FlightState, thermal: &Thermal, conditions: &FlightConditions) {
        let climb_m_s = thermal.net_climb_m_s;
        if climb_m_s <= 0.0 {
            if flight.last_node().altitude_m <= 0.0 {
                flight.finish(FlightStatus::OutOfAltitude);
            }
            return;
        }
        let landing_s = conditions.landing_time_s;
        let ceiling_m = conditions.thermal_ceiling_m;

        loop {
            let last = flight.last_node();
            if last.time_s >= landing_s {
                flight.finish(FlightStatus::OutOfTime);
                return;
            }
            if last.altitude_m >= ceiling_m {
                return;
            }

            let mut dt = self.climb_step_s;
            let time_clipped = last.time_s + dt >= landing_s;
            if time_clipped {
                dt = landing_s - last.time_s;
            }
            let ceiling_s = (ceiling_m - last.altitude_m) / climb_m_s;
            let at_ceiling = ceiling_s <= dt;
            let altitude_m = if at_ceiling {
                dt = ceiling_s;
                ceiling_m
            } else {
                last.altitude_m + climb_m_s * dt
            };
            if dt <= 0.0 {
                return;
            }

            flight.push_node(FlightNode {
                time_s: last.time_s + dt,
                altitude_m,
                distance_m: last.distance_m,
                use_thermal: true,
            });
            if at_ceiling {
                return;
            }
            if time_clipped {
                flight.finish(FlightStatus::OutOfTime);
                return;
            }
        }
    }

    /// Spend the remaining time cruising after the last thermal.
    fn glide_to_landing(&self, flight: &mut FlightState, landing_s: f64) {
        let last = flight.last_node();
        let remaining_s = landing_s - last.time_s;
        if remaining_s <= 0.0 {
            flight.finish(FlightStatus::OutOfTime);
            return;
        }
        let ground_s = self.aircraft.time_to_ground_s(last.altitude_m);
        let (dt, altitude_m, status) = if ground_s < remaining_s {
            (ground_s, 0.0, FlightStatus::OutOfAltitude)
        } else {
            (
                remaining_s,
                last.altitude_m + self.aircraft.sink_max_m_s * remaining_s,
                FlightStatus::OutOfTime,
            )
        };
        if dt > 0.0 {
            flight.push_node(FlightNode {
                time_s: last.time_s + dt,
                altitude_m,
                distance_m: last.distance_m + self.aircraft.velocity_max_m_s * dt,
                use_thermal: false,
            });
        }
        flight.finish(status);
    }

    fn run_flights(
        &self,
        policy: &dyn FlightPolicy,
        flight_count: usize,
        seed: u64,
    ) -> Vec<FlightResult<ExperimentOutput>> {
        log::debug!(
            "simulating {flight_count} flights for {} (seed {seed}, parallel={})",
            policy.name(),
            self.parallel
        );
        if self.parallel {
            (0..flight_count)
                .into_par_iter()
                .map(|index| self.simulate_indexed(policy, seed, index))
                .collect()
        } else {
            (0..flight_count)
                .map(|index| self.simulate_indexed(policy, seed, index))
                .collect()
        }
    }

    /// Run `flight_count` independent flights, failing on the first flight
    /// (in flight order) that errors.
    ///
    /// Results depend only on `seed`, not on scheduling.
    ///
    /// # Errors
    ///
    /// Returns the error of the lowest-indexed failing flight.
    pub fn simulate_batch(
        &self,
        policy: &dyn FlightPolicy,
        flight_count: usize,
        seed: u64,
    ) -> FlightResult<ExperimentOutputBatch> {
        let outputs = self
            .run_flights(policy, flight_count, seed)
            .into_iter()
            .collect::<FlightResult<Vec<_>>>()?;
        Ok(ExperimentOutputBatch::new(outputs))
    }

    /// Run a batch, keeping successful flights and recording failures.
    #[must_use]
    pub fn simulate_batch_lenient(
        &self,
        policy: &dyn FlightPolicy,
        flight_count: usize,
        seed: u64,
    ) -> LenientBatch {
        let mut result = LenientBatch::default();
        for (index, outcome) in self.run_flights(policy, flight_count, seed).into_iter().enumerate() {
            match outcome {
                Ok(output) => result.batch.outputs.push(output),
                Err(error) => result.failures.push(FlightFailure { index, error }),
            }
        }
        result
    }
}
