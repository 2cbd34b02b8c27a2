//! Incremental thermal-climb summary kept alongside a flight.
use crate::flight::{FlightState, RunningMean};

/// Caches [`FlightState::thermal_climbs`] across decision points.
///
/// Only settled steps (every step but the newest) are folded into the cache.
/// The newest step is evaluated on demand, so the simulator may retract the
/// newest node without invalidating anything.
///
/// Thermals that were probed and declined are recorded with
/// [`record_declined`](Self::record_declined) before their probe node is
/// retracted. The cache then differs from the uncached summary by exactly
/// those one-step runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimbSummarizer {
    next_step: usize,
    climbs: Vec<f64>,
    run: RunningMean,
}

impl Default for ClimbSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimbSummarizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_step: 1,
            climbs: Vec::new(),
            run: RunningMean::default(),
        }
    }

    /// Fold every settled step of `flight` not seen yet.
    pub fn sync(&mut self, flight: &FlightState) {
        let newest = flight.node_count().saturating_sub(1);
        if self.next_step > newest + 1 {
            // The flight lost folded nodes; start over.
            log::warn!("climb summary out of sync at step {}, rebuilding", self.next_step);
            *self = Self::new();
        }
        while self.next_step < newest {
            if let Some(climb) = flight.step_climb_m_s(self.next_step) {
                Self::fold(&mut self.climbs, &mut self.run, climb);
            }
            self.next_step += 1;
        }
    }

    fn fold(climbs: &mut Vec<f64>, run: &mut RunningMean, climb: f64) {
        if climb > 0.0 {
            run.push(climb);
        } else if let Some(mean) = run.take() {
            climbs.push(mean);
        }
    }

    /// Close the newest step of `flight` as an observed thermal.
    ///
    /// The step index is left unfolded, so once the node is retracted the
    /// step that replaces it is folded as usual.
    pub fn record_declined(&mut self, flight: &FlightState) {
        self.sync(flight);
        let newest = flight.node_count().saturating_sub(1);
        if newest == 0 || self.next_step != newest {
            return;
        }
        if let Some(climb) = flight.step_climb_m_s(newest) {
            Self::fold(&mut self.climbs, &mut self.run, climb);
        }
        if let Some(mean) = self.run.take() {
            self.climbs.push(mean);
        }
    }

    /// Thermal climbs of `flight` plus any declined thermals, in flight
    /// order. Equal to the uncached computation when nothing was declined.
    #[must_use]
    pub fn thermal_climbs(&self, flight: &FlightState) -> Vec<f64> {
        let mut climbs = self.climbs.clone();
        let mut run = self.run;
        let newest = flight.node_count().saturating_sub(1);
        for index in self.next_step..=newest {
            if let Some(climb) = flight.step_climb_m_s(index) {
                Self::fold(&mut climbs, &mut run, climb);
            }
        }
        climbs
    }

    /// Number of thermal runs closed among the settled steps.
    #[must_use]
    pub fn settled_count(&self) -> usize {
        self.climbs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::tests::{flight_from, node};

    #[test]
    fn matches_uncached_summary_while_growing() {
        let points = [
            (0.0, 1000.0),
            (100.0, 900.0),
            (101.0, 902.0),
            (111.0, 922.0),
            (121.0, 952.0),
            (221.0, 852.0),
            (222.0, 852.5),
            (232.0, 857.5),
            (300.0, 789.5),
        ];
        let mut summarizer = ClimbSummarizer::new();
        for len in 1..=points.len() {
            let flight = flight_from(&points[..len]);
            summarizer.sync(&flight);
            assert_eq!(
                summarizer.thermal_climbs(&flight),
                flight.thermal_climbs(),
                "diverged at {len} nodes"
            );
        }
        assert_eq!(summarizer.settled_count(), 1);
    }

    #[test]
    fn survives_probe_retraction() {
        let mut flight = flight_from(&[(0.0, 1000.0), (100.0, 900.0), (101.0, 910.0), (111.0, 1010.0)]);
        let mut summarizer = ClimbSummarizer::new();
        flight.push_node(node(211.0, 910.0, 1000.0));
        flight.push_node(node(212.0, 912.0, 1000.0));
        summarizer.sync(&flight);
        assert_eq!(summarizer.thermal_climbs(&flight), flight.thermal_climbs());
        summarizer.record_declined(&flight);
        assert!(flight.retract_last().is_some());
        summarizer.sync(&flight);
        assert_eq!(flight.thermal_climbs(), vec![10.0]);
        assert_eq!(summarizer.thermal_climbs(&flight), vec![10.0, 2.0]);
        flight.push_node(node(300.0, 822.0, 1880.0));
        summarizer.sync(&flight);
        assert_eq!(summarizer.thermal_climbs(&flight), vec![10.0, 2.0]);
        assert_eq!(summarizer.settled_count(), 2);
    }

    #[test]
    fn declined_sink_closes_nothing_new() {
        let flight = flight_from(&[(0.0, 1000.0), (100.0, 900.0), (101.0, 899.5)]);
        let mut summarizer = ClimbSummarizer::new();
        summarizer.record_declined(&flight);
        assert!(summarizer.thermal_climbs(&flight).is_empty());

        let takeoff_only = FlightState::new(0.0, 1000.0);
        let mut summarizer = ClimbSummarizer::new();
        summarizer.record_declined(&takeoff_only);
        assert_eq!(summarizer.settled_count(), 0);
    }

    #[test]
    fn rebuilds_after_losing_folded_nodes() {
        let long = flight_from(&[(0.0, 1000.0), (1.0, 1001.0), (2.0, 999.0), (3.0, 998.0)]);
        let short = flight_from(&[(0.0, 1000.0), (1.0, 1001.0)]);
        let mut summarizer = ClimbSummarizer::new();
        summarizer.sync(&long);
        summarizer.sync(&short);
        assert_eq!(summarizer.thermal_climbs(&short), short.thermal_climbs());
    }
}
