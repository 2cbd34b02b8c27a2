//! Decision-point contract and the built-in policy catalogue.
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

use crate::aircraft::AircraftModel;
use crate::climbs::ClimbSummarizer;
use crate::error::{FlightError, PolicyError};
use crate::flight::FlightState;

mod learned;
mod reference;

pub use learned::{FeedForward, Layer, LearnedPolicy, extract_features};
pub use reference::{AlwaysThermal, NeverThermal, ThreeZones};

/// Read-only view handed to a policy at each thermal.
///
/// Dereferences to the [`FlightState`] and adds the cached thermal-climb
/// summary.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    state: &'a FlightState,
    climbs: &'a ClimbSummarizer,
}

impl<'a> DecisionContext<'a> {
    #[must_use]
    pub const fn new(state: &'a FlightState, climbs: &'a ClimbSummarizer) -> Self {
        Self { state, climbs }
    }

    #[must_use]
    pub const fn state(&self) -> &'a FlightState {
        self.state
    }

    /// Mean climb of every thermal met so far, in flight order.
    ///
    /// Matches [`FlightState::thermal_climbs`] plus one entry per thermal
    /// that was probed and declined.
    #[must_use]
    pub fn thermal_climbs(&self) -> Vec<f64> {
        self.climbs.thermal_climbs(self.state)
    }
}

impl Deref for DecisionContext<'_> {
    type Target = FlightState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

/// Decides whether to climb in the thermal the glider is probing.
///
/// Called once per thermal reached in flight, after the cruise and probe
/// nodes exist and before any climb node.
pub trait FlightPolicy: Send + Sync {
    /// Name used in logs, reports and experiment records.
    fn name(&self) -> &str;

    /// Return `true` to climb in the current thermal.
    ///
    /// # Errors
    ///
    /// Returns a [`FlightError`] when the flight cannot be evaluated, which
    /// aborts the flight.
    fn use_thermal(
        &self,
        flight: &DecisionContext<'_>,
        aircraft: &AircraftModel,
    ) -> Result<bool, FlightError>;

    /// Digest of any state loaded from outside the name, such as weights.
    /// Policies fully described by their name return `None`.
    fn fingerprint(&self) -> Option<String> {
        None
    }
}

impl<P: FlightPolicy + ?Sized> FlightPolicy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn use_thermal(
        &self,
        flight: &DecisionContext<'_>,
        aircraft: &AircraftModel,
    ) -> Result<bool, FlightError> {
        (**self).use_thermal(flight, aircraft)
    }

    fn fingerprint(&self) -> Option<String> {
        (**self).fingerprint()
    }
}

/// Textual policy selector: `never`, `always`, `three-zones:P:L` or
/// `learned:PATH`.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicySpec {
    Never,
    Always,
    ThreeZones {
        progress_quantile: f64,
        lift_quantile: f64,
    },
    Learned(PathBuf),
}

impl PolicySpec {
    /// Build the named policy.
    ///
    /// # Errors
    ///
    /// Returns an error when quantiles are out of range or learned weights
    /// cannot be loaded.
    pub fn create(&self) -> Result<Box<dyn FlightPolicy>, PolicyError> {
        Ok(match self {
            Self::Never => Box::new(NeverThermal),
            Self::Always => Box::new(AlwaysThermal),
            Self::ThreeZones {
                progress_quantile,
                lift_quantile,
            } => Box::new(ThreeZones::new(*progress_quantile, *lift_quantile)?),
            Self::Learned(path) => Box::new(LearnedPolicy::load(path)?),
        })
    }
}

impl fmt::Display for PolicySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("never"),
            Self::Always => f.write_str("always"),
            Self::ThreeZones {
                progress_quantile,
                lift_quantile,
            } => write!(f, "three-zones:{progress_quantile}:{lift_quantile}"),
            Self::Learned(path) => write!(f, "learned:{}", path.display()),
        }
    }
}

fn parse_quantile(token: &str) -> Result<f64, PolicyError> {
    token.trim().parse().map_err(|_| PolicyError::Parameter {
        policy: "three-zones",
        value: token.to_string(),
        reason: "not a number".to_string(),
    })
}

impl FromStr for PolicySpec {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let (kind, rest) = token.split_once(':').unwrap_or((token, ""));
        match kind.to_ascii_lowercase().as_str() {
            "never" | "never-thermal" if rest.is_empty() => Ok(Self::Never),
            "always" | "always-thermal" if rest.is_empty() => Ok(Self::Always),
            "three-zones" | "three_zones" | "zones" => {
                let (progress, lift) = rest.split_once(':').ok_or_else(|| {
                    PolicyError::Parameter {
                        policy: "three-zones",
                        value: rest.to_string(),
                        reason: "expected PROGRESS:LIFT quantiles".to_string(),
                    }
                })?;
                Ok(Self::ThreeZones {
                    progress_quantile: parse_quantile(progress)?,
                    lift_quantile: parse_quantile(lift)?,
                })
            }
            "learned" if !rest.is_empty() => Ok(Self::Learned(PathBuf::from(rest))),
            "learned" => Err(PolicyError::Parameter {
                policy: "learned",
                value: String::new(),
                reason: "expected learned:PATH to a weights file".to_string(),
            }),
            _ => Err(PolicyError::Unknown(token.to_string())),
        }
    }
}
