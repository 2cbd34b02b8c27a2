//! Flight trajectory and the metrics derived from it.
use serde::{Deserialize, Serialize};

use crate::error::FlightError;
use crate::numbers::usize_to_f64;

/// Lifecycle of a flight. Leaves `Flying` exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    #[default]
    Flying,
    OutOfTime,
    OutOfAltitude,
}

impl FlightStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Flying)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flying => "flying",
            Self::OutOfTime => "out_of_time",
            Self::OutOfAltitude => "out_of_altitude",
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One trajectory sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightNode {
    pub time_s: f64,
    pub altitude_m: f64,
    pub distance_m: f64,
    pub use_thermal: bool,
}

/// Parallel trajectory series plus the terminal status.
///
/// Every series always holds the same number of nodes, and there is at
/// least one node (the takeoff). Only the simulator mutates a flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    time_s: Vec<f64>,
    altitude_m: Vec<f64>,
    distance_m: Vec<f64>,
    use_thermal: Vec<bool>,
    status: FlightStatus,
}

impl FlightState {
    /// Start a flight with the single takeoff node at distance 0.
    #[must_use]
    pub fn new(take_off_time_s: f64, take_off_altitude_m: f64) -> Self {
        Self {
            time_s: vec![take_off_time_s],
            altitude_m: vec![take_off_altitude_m],
            distance_m: vec![0.0],
            use_thermal: vec![false],
            status: FlightStatus::Flying,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.time_s.len()
    }

    #[must_use]
    pub fn time_s(&self) -> &[f64] {
        &self.time_s
    }

    #[must_use]
    pub fn altitude_m(&self) -> &[f64] {
        &self.altitude_m
    }

    #[must_use]
    pub fn distance_m(&self) -> &[f64] {
        &self.distance_m
    }

    #[must_use]
    pub fn use_thermal(&self) -> &[bool] {
        &self.use_thermal
    }

    #[must_use]
    pub const fn status(&self) -> FlightStatus {
        self.status
    }

    #[must_use]
    pub const fn is_flying(&self) -> bool {
        matches!(self.status, FlightStatus::Flying)
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<FlightNode> {
        Some(FlightNode {
            time_s: *self.time_s.get(index)?,
            altitude_m: *self.altitude_m.get(index)?,
            distance_m: *self.distance_m.get(index)?,
            use_thermal: *self.use_thermal.get(index)?,
        })
    }

    /// Most recent node. A flight always has one.
    #[must_use]
    pub fn last_node(&self) -> FlightNode {
        let last = self.node_count().saturating_sub(1);
        self.node(last).unwrap_or(FlightNode {
            time_s: 0.0,
            altitude_m: 0.0,
            distance_m: 0.0,
            use_thermal: false,
        })
    }

    #[must_use]
    pub fn take_off_time_s(&self) -> f64 {
        self.time_s.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn take_off_altitude_m(&self) -> f64 {
        self.altitude_m.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn final_distance_m(&self) -> f64 {
        self.distance_m.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn final_time_s(&self) -> f64 {
        self.time_s.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn duration_s(&self) -> f64 {
        self.final_time_s() - self.take_off_time_s()
    }

    /// Number of thermals climbed: contiguous blocks of `use_thermal` nodes.
    #[must_use]
    pub fn thermals_used(&self) -> usize {
        let mut count = 0;
        let mut previous = false;
        for &used in &self.use_thermal {
            if used && !previous {
                count += 1;
            }
            previous = used;
        }
        count
    }

    /// Total time of steps ending on a `use_thermal` node.
    #[must_use]
    pub fn climb_time_s(&self) -> f64 {
        (1..self.node_count())
            .filter(|&i| self.use_thermal[i])
            .map(|i| self.time_s[i] - self.time_s[i - 1])
            .sum()
    }

    /// Climb rate of the step ending at `index`, `None` for the first node or
    /// a zero time delta.
    #[must_use]
    pub fn step_climb_m_s(&self, index: usize) -> Option<f64> {
        if index == 0 || index >= self.node_count() {
            return None;
        }
        let dt = self.time_s[index] - self.time_s[index - 1];
        if dt <= 0.0 {
            return None;
        }
        Some((self.altitude_m[index] - self.altitude_m[index - 1]) / dt)
    }

    /// Climb between the last two nodes, 0 before the first step.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::ZeroTimeStep`] when the last two nodes share a
    /// timestamp.
    pub fn current_climb_m_s(&self) -> Result<f64, FlightError> {
        let count = self.node_count();
        if count < 2 {
            return Ok(0.0);
        }
        self.step_climb_m_s(count - 1)
            .ok_or(FlightError::ZeroTimeStep {
                index: count - 2,
                next: count - 1,
                time_s: self.time_s[count - 1],
            })
    }

    /// Climb rate of every step, skipping zero-duration steps.
    #[must_use]
    pub fn all_climbs(&self) -> Vec<f64> {
        (1..self.node_count())
            .filter_map(|i| self.step_climb_m_s(i))
            .collect()
    }

    /// Mean climb per contiguous run of rising steps.
    ///
    /// A run is only reported once a non-positive step closes it, so a climb
    /// still in progress is not included.
    #[must_use]
    pub fn thermal_climbs(&self) -> Vec<f64> {
        let mut climbs = Vec::new();
        let mut run = RunningMean::default();
        for climb in self.all_climbs() {
            if climb > 0.0 {
                run.push(climb);
            } else if let Some(mean) = run.take() {
                climbs.push(mean);
            }
        }
        climbs
    }

    /// True when the series agree in length and time and distance never
    /// go backwards.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let n = self.time_s.len();
        n > 0
            && self.altitude_m.len() == n
            && self.distance_m.len() == n
            && self.use_thermal.len() == n
            && self.time_s.windows(2).all(|w| w[1] >= w[0])
            && self.distance_m.windows(2).all(|w| w[1] >= w[0])
    }

    pub(crate) fn push_node(&mut self, node: FlightNode) {
        self.time_s.push(node.time_s);
        self.altitude_m.push(node.altitude_m);
        self.distance_m.push(node.distance_m);
        self.use_thermal.push(node.use_thermal);
    }

    /// Drop the newest node; the takeoff node is never removed.
    pub(crate) fn retract_last(&mut self) -> Option<FlightNode> {
        if self.node_count() < 2 {
            return None;
        }
        Some(FlightNode {
            time_s: self.time_s.pop()?,
            altitude_m: self.altitude_m.pop()?,
            distance_m: self.distance_m.pop()?,
            use_thermal: self.use_thermal.pop()?,
        })
    }

    pub(crate) fn mark_last_thermal(&mut self) {
        if let Some(flag) = self.use_thermal.last_mut() {
            *flag = true;
        }
    }

    /// Record the terminal status. Later calls are ignored.
    pub(crate) fn finish(&mut self, status: FlightStatus) {
        if self.is_flying() {
            self.status = status;
        }
    }
}

/// Sum and count of an open run of climbs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    pub(crate) fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / usize_to_f64(self.count))
    }

    /// Close the run, returning its mean if it had any values.
    pub(crate) fn take(&mut self) -> Option<f64> {
        let mean = self.mean();
        *self = Self::default();
        mean
    }
}
