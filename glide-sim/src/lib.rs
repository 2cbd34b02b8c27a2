//! Glide Sim Flight Engine
//!
//! Monte Carlo simulation of cross-country glider flights through randomly
//! sampled thermals, with pluggable policies deciding where to climb.
//! This crate has no CLI or storage dependencies; see `glide-tester` for the
//! comparison harness.

pub mod aircraft;
pub mod analysis;
pub mod climbs;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod error;
pub mod experiment;
pub mod flight;
pub mod numbers;
pub mod policy;
pub mod simulator;
pub mod stats;
pub mod thermal;

// Re-export commonly used types
pub use aircraft::AircraftModel;
pub use analysis::{BatchSummary, MetricSummary, PolicyComparison};
pub use climbs::ClimbSummarizer;
pub use conditions::{ClimbMeanRange, ClippedNormal, FlightConditions, FlightConditionsDistribution};
pub use config::SimulationConfig;
pub use error::{ConfigError, FlightError, FlightResult, PolicyError};
pub use experiment::{ExperimentInput, ExperimentOutput, ExperimentOutputBatch};
pub use flight::{FlightNode, FlightState, FlightStatus};
pub use policy::{
    AlwaysThermal, DecisionContext, FeedForward, FlightPolicy, LearnedPolicy, NeverThermal,
    PolicySpec, ThreeZones, extract_features,
};
pub use simulator::{FlightFailure, LenientBatch, Simulator};
pub use thermal::{Thermal, ThermalField};
