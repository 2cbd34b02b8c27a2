//! Batch summaries for comparing policies.
use serde::{Deserialize, Serialize};

use crate::experiment::ExperimentOutputBatch;
use crate::flight::FlightStatus;
use crate::numbers::{fraction, usize_to_f64};
use crate::stats;

/// Five-number style summary of one metric across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl MetricSummary {
    /// All zeros for an empty sample.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: stats::mean(values).unwrap_or_default(),
            std: stats::std_dev(values).unwrap_or_default(),
            min: stats::min(values).unwrap_or_default(),
            median: stats::median(values).unwrap_or_default(),
            max: stats::max(values).unwrap_or_default(),
        }
    }
}

/// Aggregate outcome of one policy over one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub policy_name: String,
    pub flight_count: usize,
    pub distance_m: MetricSummary,
    pub duration_s: MetricSummary,
    pub out_of_time_rate: f64,
    pub out_of_altitude_rate: f64,
    pub mean_thermals_used: f64,
    pub mean_climb_time_s: f64,
}

impl BatchSummary {
    #[must_use]
    pub fn from_batch(policy_name: &str, batch: &ExperimentOutputBatch) -> Self {
        let flights: Vec<_> = batch.iter().map(|o| &o.flight_state).collect();
        let count = flights.len();
        let distances: Vec<f64> = flights.iter().map(|f| f.final_distance_m()).collect();
        let durations: Vec<f64> = flights.iter().map(|f| f.duration_s()).collect();
        let status_count =
            |status: FlightStatus| flights.iter().filter(|f| f.status() == status).count();
        let thermals_used: usize = flights.iter().map(|f| f.thermals_used()).sum();
        let climb_time_s: f64 = flights.iter().map(|f| f.climb_time_s()).sum();

        Self {
            policy_name: policy_name.to_string(),
            flight_count: count,
            distance_m: MetricSummary::from_values(&distances),
            duration_s: MetricSummary::from_values(&durations),
            out_of_time_rate: fraction(status_count(FlightStatus::OutOfTime), count),
            out_of_altitude_rate: fraction(status_count(FlightStatus::OutOfAltitude), count),
            mean_thermals_used: fraction(thermals_used, count),
            mean_climb_time_s: if count == 0 {
                0.0
            } else {
                climb_time_s / usize_to_f64(count)
            },
        }
    }
}

/// Summaries of several policies flown over the same seeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyComparison {
    pub seed: u64,
    pub summaries: Vec<BatchSummary>,
}

impl PolicyComparison {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            summaries: Vec::new(),
        }
    }

    pub fn push(&mut self, summary: BatchSummary) {
        self.summaries.push(summary);
    }

    /// Summary with the highest mean distance.
    #[must_use]
    pub fn best_by_mean_distance(&self) -> Option<&BatchSummary> {
        self.summaries
            .iter()
            .max_by(|a, b| a.distance_m.mean.total_cmp(&b.distance_m.mean))
    }

    #[must_use]
    pub fn get(&self, policy_name: &str) -> Option<&BatchSummary> {
        self.summaries.iter().find(|s| s.policy_name == policy_name)
    }
}
