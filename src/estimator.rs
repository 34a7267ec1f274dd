use std::f64::consts::PI;
use std::time::{Duration, Instant};

use tracing::{info, info_span};

use crate::aggregate::aggregate;
use crate::config::EstimatorConfig;
use crate::error::{EstimateError, Result};
use crate::partition::{partition, total_trials};
use crate::strategy::{enter, isolated, locked, pooled, unsync, Phase, Strategy};

/// Outcome of one estimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    pub strategy: Strategy,
    pub pi_estimate: f64,
    pub elapsed: Duration,
    /// Hits as seen by the coordinator after joining.
    pub hits: u64,
    /// Trials actually dispatched; the requested budget minus the remainder.
    pub trials: u64,
    pub total_points: u64,
    pub worker_count: usize,
    /// Base seed, so the run can be replayed.
    pub seed: u64,
}

impl EstimationResult {
    pub fn abs_error(&self) -> f64 {
        (self.pi_estimate - PI).abs()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Estimator {
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate(
        &self,
        strategy: Strategy,
        total_points: u64,
        worker_count: usize,
    ) -> Result<EstimationResult> {
        let span = info_span!("estimate", %strategy, total_points, worker_count);
        let _entered = span.enter();

        let start = Instant::now();
        enter(Phase::Created);
        if total_points == 0 {
            return Err(EstimateError::config("total points must be positive"));
        }
        let seed = self.config.seed.unwrap_or_else(rand::random);

        enter(Phase::Partitioning);
        let items = partition(total_points, worker_count)?;

        let stack_size = self.config.worker_stack_size;
        let partials = match strategy {
            Strategy::IsolatedProcess => {
                let program = self.config.resolve_worker_program()?;
                isolated::run(&items, seed, &program)?
            }
            Strategy::UnsyncShared => unsync::run(&items, seed, stack_size)?,
            Strategy::Pooled => pooled::run(&items, seed, worker_count, stack_size)?,
            Strategy::LockGuarded => locked::run(&items, seed, stack_size)?,
        };

        enter(Phase::Aggregating);
        let pi_estimate = aggregate(&partials, total_points)?;
        let hits: u64 = partials.iter().map(|partial| partial.hits()).sum();
        let elapsed = start.elapsed();
        enter(Phase::Done);

        info!(pi_estimate, hits, ?elapsed, seed, "estimate ready");
        Ok(EstimationResult {
            strategy,
            pi_estimate,
            elapsed,
            hits,
            trials: total_trials(&items),
            total_points,
            worker_count,
            seed,
        })
    }
}

/// Estimates π with `strategy`, configured from the environment.
///
/// The isolated-process strategy needs a worker program: either
/// `MONTE_CARLO_PI_WORKER`, or the calling binary after it ran
/// [`crate::strategy::isolated::init`].
pub fn estimate_pi(
    strategy: Strategy,
    total_points: u64,
    worker_count: usize,
) -> Result<EstimationResult> {
    Estimator::new(EstimatorConfig::from_env()?).estimate(strategy, total_points, worker_count)
}
