//! Feed-forward regressor policy with JSON weights.
use std::fs;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::aircraft::AircraftModel;
use crate::constants::{
    DEFAULT_HIDDEN_SIZES, FEATURE_COUNT, FEATURE_DECILES, FEATURE_MAX_TIME_S, LEARNED_MIN_LIFT_M_S,
};
use crate::error::{FlightError, PolicyError};
use crate::flight::FlightState;
use crate::numbers::usize_to_f64;
use crate::stats::quantiles;

use super::{DecisionContext, FlightPolicy};

/// Dense layer; `weights[row]` holds the input weights of output `row`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl Layer {
    fn inputs(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn outputs(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }

    fn xavier<R: Rng>(rng: &mut R, inputs: usize, outputs: usize) -> Self {
        let bound = (6.0 / usize_to_f64(inputs + outputs)).sqrt();
        let weights = (0..outputs)
            .map(|_| (0..inputs).map(|_| rng.gen_range(-bound..=bound)).collect())
            .collect();
        Self {
            weights,
            biases: vec![0.0; outputs],
        }
    }
}

/// ReLU hidden layers followed by a single sigmoid output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedForward {
    layers: Vec<Layer>,
}

impl FeedForward {
    /// Wrap layers after checking that their shapes chain from the feature
    /// vector down to one output.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::LayerShape`] for mismatched layers and
    /// [`PolicyError::OutputShape`] when the last layer is not a single unit.
    pub fn new(layers: Vec<Layer>) -> Result<Self, PolicyError> {
        let mut expected = FEATURE_COUNT;
        for (index, layer) in layers.iter().enumerate() {
            let ragged = layer.weights.iter().any(|row| row.len() != expected);
            if layer.outputs() == 0 || ragged {
                return Err(PolicyError::LayerShape {
                    layer: index,
                    expected,
                    actual: layer.inputs(),
                });
            }
            if layer.biases.len() != layer.outputs() {
                return Err(PolicyError::LayerShape {
                    layer: index,
                    expected: layer.outputs(),
                    actual: layer.biases.len(),
                });
            }
            expected = layer.outputs();
        }
        if layers.is_empty() || expected != 1 {
            return Err(PolicyError::OutputShape(if layers.is_empty() {
                0
            } else {
                expected
            }));
        }
        Ok(Self { layers })
    }

    /// Xavier-uniform weights and zero biases from a fixed seed.
    #[must_use]
    pub fn xavier(hidden_sizes: &[usize], seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(hidden_sizes.len() + 1);
        let mut inputs = FEATURE_COUNT;
        for &size in hidden_sizes.iter().filter(|&&size| size > 0) {
            layers.push(Layer::xavier(&mut rng, inputs, size));
            inputs = size;
        }
        layers.push(Layer::xavier(&mut rng, inputs, 1));
        Self { layers }
    }

    /// Parse and validate network weights.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or the layer shapes do not
    /// chain.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let raw: Self = serde_json::from_str(json)?;
        Self::new(raw.layers)
    }

    /// # Errors
    ///
    /// Propagates serialization failures.
    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Score a feature vector in `(0, 1)`.
    #[must_use]
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut activation = features.to_vec();
        let last = self.layers.len().saturating_sub(1);
        for (index, layer) in self.layers.iter().enumerate() {
            activation = layer.forward(&activation);
            if index < last {
                for value in &mut activation {
                    *value = value.max(0.0);
                }
            }
        }
        let logit = activation.first().copied().unwrap_or_default();
        1.0 / (1.0 + (-logit).exp())
    }
}

/// Build the model input for `flight` with the use-thermal flag set to
/// `use_thermal`.
///
/// Layout: ten deciles of every step climb (zeros before the first step),
/// altitude over takeoff altitude, current lift, elapsed time over six hours
/// capped at 1, then the flag.
///
/// # Errors
///
/// Returns [`FlightError::ZeroTimeStep`] when the last step has no duration.
pub fn extract_features(
    flight: &FlightState,
    use_thermal: bool,
) -> Result<[f64; FEATURE_COUNT], FlightError> {
    let mut features = [0.0; FEATURE_COUNT];
    let decile_qs: Vec<f64> = (1..=FEATURE_DECILES)
        .map(|q| usize_to_f64(q) / usize_to_f64(FEATURE_DECILES))
        .collect();
    if let Some(deciles) = quantiles(&flight.all_climbs(), &decile_qs) {
        features[..FEATURE_DECILES].copy_from_slice(&deciles);
    }

    let take_off = flight.take_off_altitude_m();
    features[FEATURE_DECILES] = if take_off > 0.0 {
        flight.last_node().altitude_m / take_off
    } else {
        0.0
    };
    features[FEATURE_DECILES + 1] = flight.current_climb_m_s()?;
    features[FEATURE_DECILES + 2] = (flight.duration_s() / FEATURE_MAX_TIME_S).min(1.0);
    features[FEATURE_DECILES + 3] = if use_thermal { 1.0 } else { 0.0 };
    Ok(features)
}

/// Climbs when the network scores "use" above "skip".
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedPolicy {
    network: FeedForward,
}

impl LearnedPolicy {
    #[must_use]
    pub const fn new(network: FeedForward) -> Self {
        Self { network }
    }

    /// Load weights from `path`, falling back to the seeded Xavier network
    /// when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        if !path.exists() {
            log::warn!(
                "no weights at {}, using seeded initialization",
                path.display()
            );
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        let network = FeedForward::from_json(&json)?;
        log::debug!(
            "loaded {} layers from {}",
            network.layers().len(),
            path.display()
        );
        Ok(Self::new(network))
    }

    #[must_use]
    pub const fn network(&self) -> &FeedForward {
        &self.network
    }

    /// Hex SHA-256 of the compact network JSON.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures.
    pub fn network_digest(&self) -> Result<String, PolicyError> {
        let json = serde_json::to_vec(&self.network)?;
        Ok(format!("{:x}", Sha256::digest(&json)))
    }
}

impl Default for LearnedPolicy {
    fn default() -> Self {
        Self::new(FeedForward::xavier(&DEFAULT_HIDDEN_SIZES, 0))
    }
}

impl FlightPolicy for LearnedPolicy {
    fn name(&self) -> &str {
        "learned"
    }

    fn use_thermal(
        &self,
        flight: &DecisionContext<'_>,
        _aircraft: &AircraftModel,
    ) -> Result<bool, FlightError> {
        if flight.current_climb_m_s()? <= LEARNED_MIN_LIFT_M_S {
            return Ok(false);
        }
        let use_score = self.network.predict(&extract_features(flight, true)?);
        let skip_score = self.network.predict(&extract_features(flight, false)?);
        Ok(use_score > skip_score)
    }

    fn fingerprint(&self) -> Option<String> {
        self.network_digest()
            .inspect_err(|err| log::warn!("cannot fingerprint learned weights: {err}"))
            .ok()
    }
}
