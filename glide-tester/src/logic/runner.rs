use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glide_sim::{
    BatchSummary, ExperimentInput, ExperimentOutputBatch, PolicyComparison, PolicySpec,
    SimulationConfig, Simulator,
};
use serde::Serialize;

use super::store::ResultStore;

/// Settings shared by every policy in a comparison.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: SimulationConfig,
    pub flights: usize,
    pub seed: u64,
    pub fail_fast: bool,
    pub parallel: bool,
    pub verbose: bool,
}

/// A flight that aborted during a lenient run.
#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub index: usize,
    pub message: String,
}

/// Outcome of flying one policy over the batch.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyRun {
    pub policy: String,
    pub summary: BatchSummary,
    pub failures: Vec<RunFailure>,
    pub cached: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Every policy run plus the comparison built from their summaries.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRun {
    pub flights: usize,
    pub comparison: PolicyComparison,
    pub runs: Vec<PolicyRun>,
}

impl ComparisonRun {
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.runs.iter().map(|r| r.failures.len()).sum()
    }
}

/// Fly every policy over the same seeds and summarize the batches.
///
/// Batches found in `store` are reused; complete fresh batches are written
/// back to it.
///
/// # Errors
///
/// Returns an error for invalid configuration, policies that cannot be
/// built, store failures, or (with `fail_fast`) the first failing flight.
pub fn run_comparison(
    options: &RunOptions,
    policies: &[PolicySpec],
    store: Option<&ResultStore>,
) -> Result<ComparisonRun> {
    let simulator = Simulator::from_config(&options.config)
        .context("invalid simulation configuration")?
        .with_parallelism(options.parallel);

    let mut comparison = PolicyComparison::new(options.seed);
    let mut runs = Vec::with_capacity(policies.len());

    for spec in policies {
        let run = run_policy(&simulator, options, spec, store)?;
        if options.verbose {
            eprintln!(
                "  {} {} flights in {:?}{}",
                run.policy,
                run.summary.flight_count,
                run.elapsed,
                if run.cached { " (cached)" } else { "" }
            );
        }
        comparison.push(run.summary.clone());
        runs.push(run);
    }

    Ok(ComparisonRun {
        flights: options.flights,
        comparison,
        runs,
    })
}

fn run_policy(
    simulator: &Simulator,
    options: &RunOptions,
    spec: &PolicySpec,
    store: Option<&ResultStore>,
) -> Result<PolicyRun> {
    let start = Instant::now();
    let policy = spec
        .create()
        .with_context(|| format!("cannot build policy {spec}"))?;
    let input = ExperimentInput {
        distribution: options.config.distribution.clone(),
        aircraft: options.config.aircraft,
        policy: spec.to_string(),
        policy_fingerprint: policy.fingerprint(),
        seed: options.seed,
        flight_count: options.flights,
        climb_step_s: options.config.climb_step_s,
    };

    if let Some(store) = store
        && let Some(batch) = store.load(&input)?
    {
        log::info!("{spec}: reusing cached batch");
        return Ok(finish(spec, policy.name(), &batch, Vec::new(), true, start));
    }

    let (batch, failures) = if options.fail_fast {
        let batch = simulator
            .simulate_batch(&*policy, options.flights, options.seed)
            .with_context(|| format!("{spec} failed"))?;
        (batch, Vec::new())
    } else {
        let lenient = simulator.simulate_batch_lenient(&*policy, options.flights, options.seed);
        let failures: Vec<RunFailure> = lenient
            .failures
            .into_iter()
            .map(|f| RunFailure {
                index: f.index,
                message: f.error.to_string(),
            })
            .collect();
        (lenient.batch, failures)
    };

    if failures.is_empty() {
        if let Some(store) = store {
            store.save(&input, &batch)?;
        }
    } else {
        log::warn!("{spec}: {} flights failed", failures.len());
    }
    Ok(finish(spec, policy.name(), &batch, failures, false, start))
}

fn finish(
    spec: &PolicySpec,
    policy_name: &str,
    batch: &ExperimentOutputBatch,
    failures: Vec<RunFailure>,
    cached: bool,
    start: Instant,
) -> PolicyRun {
    PolicyRun {
        policy: spec.to_string(),
        summary: BatchSummary::from_batch(policy_name, batch),
        failures,
        cached,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glide_sim::FeedForward;

    fn options(flights: usize) -> RunOptions {
        RunOptions {
            config: SimulationConfig::default_config(),
            flights,
            seed: 1337,
            fail_fast: false,
            parallel: true,
            verbose: false,
        }
    }

    #[test]
    fn compares_reference_policies() {
        let specs = vec![PolicySpec::Never, PolicySpec::Always];
        let run = run_comparison(&options(20), &specs, None).unwrap();
        assert_eq!(run.runs.len(), 2);
        assert_eq!(run.failure_count(), 0);
        assert_eq!(run.comparison.summaries[0].policy_name, "never_thermal");
        assert_eq!(run.runs[1].policy, "always");
        assert!(run.runs.iter().all(|r| r.summary.flight_count == 20));
    }

    fn scratch_dir(label: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "glide-runner-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn second_run_hits_the_cache() {
        let dir = scratch_dir("cache");
        let store = ResultStore::open(&dir).unwrap();
        let specs = vec![PolicySpec::Always];
        let first = run_comparison(&options(5), &specs, Some(&store)).unwrap();
        let second = run_comparison(&options(5), &specs, Some(&store)).unwrap();
        assert!(!first.runs[0].cached);
        assert!(second.runs[0].cached);
        assert_eq!(first.runs[0].summary, second.runs[0].summary);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn retrained_weights_miss_the_cache() {
        let dir = scratch_dir("weights");
        let store = ResultStore::open(dir.join("store")).unwrap();
        let weights = dir.join("weights.json");
        let write = |seed: u64| {
            let network = FeedForward::xavier(&[8], seed);
            std::fs::write(&weights, network.to_json().unwrap()).unwrap();
        };
        let specs = vec![PolicySpec::Learned(weights.clone())];

        write(1);
        let first = run_comparison(&options(3), &specs, Some(&store)).unwrap();
        let again = run_comparison(&options(3), &specs, Some(&store)).unwrap();
        write(2);
        let retrained = run_comparison(&options(3), &specs, Some(&store)).unwrap();

        assert!(!first.runs[0].cached);
        assert!(again.runs[0].cached);
        assert!(!retrained.runs[0].cached);
        let _ = std::fs::remove_dir_all(dir);
    }
}
