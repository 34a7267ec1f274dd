//! Same shape as the unsynchronized strategy, but each increment happens
//! while holding the counter's mutex. Exact, and every hit serializes on
//! the lock.

use std::sync::Mutex;

use tracing::debug;

use super::{enter, run_scoped, Phase};
use crate::error::{EstimateError, Result};
use crate::partition::total_trials;
use crate::sampler::{hit, PartialResult, WorkItem};

pub fn run(items: &[WorkItem], seed: u64, stack_size: Option<usize>) -> Result<Vec<PartialResult>> {
    let inside = Mutex::new(0u64);

    enter(Phase::Dispatching);
    run_scoped(items, stack_size, |item| {
        let mut rng = item.rng(seed);
        for _ in 0..item.trial_count {
            if hit(&mut rng) {
                // Guard lives for this increment only.
                let mut count = inside
                    .lock()
                    .map_err(|_| EstimateError::worker(item.worker, "counter lock poisoned"))?;
                *count += 1;
            }
        }
        Ok(())
    })?;

    // Every worker has been joined; a poisoned lock here cannot be pinned on one.
    let counted = inside
        .into_inner()
        .map_err(|_| EstimateError::unattributed("counter lock poisoned"))?;
    debug!(counted, "guarded counter read");
    Ok(vec![PartialResult::new(counted, total_trials(items))?])
}
