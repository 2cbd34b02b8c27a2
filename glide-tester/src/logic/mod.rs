pub mod policies;
pub mod reports;
pub mod runner;
pub mod store;

pub use policies::{DEFAULT_POLICIES, resolve_policies, split_csv};
pub use runner::{ComparisonRun, PolicyRun, RunFailure, RunOptions, run_comparison};
pub use store::{ResultStore, StoreError};
