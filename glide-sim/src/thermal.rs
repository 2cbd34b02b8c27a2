//! Thermals and the ordered field sampled for one flight.
use serde::{Deserialize, Serialize};

/// A single updraft segment along the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thermal {
    pub distance_start_m: f64,
    pub distance_end_m: f64,
    pub net_climb_m_s: f64,
}

impl Thermal {
    #[must_use]
    pub const fn new(distance_start_m: f64, distance_end_m: f64, net_climb_m_s: f64) -> Self {
        Self {
            distance_start_m,
            distance_end_m,
            net_climb_m_s,
        }
    }

    /// Midpoint of the thermal; the cruise phase targets this point.
    #[must_use]
    pub fn distance_center_m(&self) -> f64 {
        (self.distance_start_m + self.distance_end_m) / 2.0
    }

    #[must_use]
    pub fn width_m(&self) -> f64 {
        self.distance_end_m - self.distance_start_m
    }

    #[must_use]
    pub fn contains(&self, distance_m: f64) -> bool {
        (self.distance_start_m..=self.distance_end_m).contains(&distance_m)
    }
}

/// Ordered thermals for one flight, consumed front to back by the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThermalField {
    thermals: Vec<Thermal>,
}

impl ThermalField {
    /// Wrap an already ordered list of thermals.
    #[must_use]
    pub fn new(thermals: Vec<Thermal>) -> Self {
        Self { thermals }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.thermals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thermals.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Thermal> {
        self.thermals.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Thermal> {
        self.thermals.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Thermal] {
        &self.thermals
    }

    /// End of the last thermal, 0 for an empty field.
    #[must_use]
    pub fn distance_end_m(&self) -> f64 {
        self.thermals.last().map_or(0.0, |t| t.distance_end_m)
    }

    /// True when thermals are strictly ordered and each has positive width.
    #[must_use]
    pub fn is_well_ordered(&self) -> bool {
        self.first_disorder().is_none()
    }

    /// Index of the first thermal that has no width or does not start after
    /// its predecessor.
    #[must_use]
    pub fn first_disorder(&self) -> Option<usize> {
        self.thermals.iter().enumerate().find_map(|(index, thermal)| {
            let narrow = thermal.distance_end_m <= thermal.distance_start_m;
            let behind = index > 0
                && self.thermals[index - 1].distance_start_m >= thermal.distance_start_m;
            (narrow || behind).then_some(index)
        })
    }

    pub(crate) fn push(&mut self, thermal: Thermal) {
        self.thermals.push(thermal);
    }

    /// Blocky `(distance, strength)` series describing the field for plotting.
    ///
    /// Strength is zero between thermals and equal to the net climb across
    /// each thermal. The series starts at 0 and ends at `distance_max_m` when
    /// the field stops short of it.
    #[must_use]
    pub fn strength_series(&self, distance_max_m: f64) -> (Vec<f64>, Vec<f64>) {
        let mut distance = vec![0.0];
        let mut strength = vec![0.0];

        for thermal in &self.thermals {
            distance.push(thermal.distance_start_m);
            strength.push(0.0);
            distance.push(thermal.distance_start_m);
            strength.push(thermal.net_climb_m_s);
            distance.push(thermal.distance_end_m);
            strength.push(thermal.net_climb_m_s);
            if thermal.distance_end_m < distance_max_m {
                distance.push(thermal.distance_end_m);
                strength.push(0.0);
            }
        }

        if distance.last().is_some_and(|&d| d < distance_max_m) {
            distance.push(distance_max_m);
            strength.push(0.0);
        }

        (distance, strength)
    }
}

impl<'a> IntoIterator for &'a ThermalField {
    type Item = &'a Thermal;
    type IntoIter = std::slice::Iter<'a, Thermal>;

    fn into_iter(self) -> Self::IntoIter {
        self.thermals.iter()
    }
}

impl From<Vec<Thermal>> for ThermalField {
    fn from(thermals: Vec<Thermal>) -> Self {
        Self::new(thermals)
    }
}
