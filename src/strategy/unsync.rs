//! Shared-memory threads bumping one counter with no mutual exclusion.
//!
//! The increment is a separate load and store, so two threads that read the
//! same value both write back `value + 1` and one hit disappears. The final
//! count is a nondeterministic lower bound on the true hit count. This is the
//! hazard being demonstrated; do not replace it with `fetch_add`.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::{enter, run_scoped, Phase};
use crate::error::Result;
use crate::partition::total_trials;
use crate::sampler::{hit, PartialResult, WorkItem};

pub fn run(items: &[WorkItem], seed: u64, stack_size: Option<usize>) -> Result<Vec<PartialResult>> {
    let inside = AtomicU64::new(0);

    enter(Phase::Dispatching);
    run_scoped(items, stack_size, |item| {
        let mut rng = item.rng(seed);
        for _ in 0..item.trial_count {
            if hit(&mut rng) {
                let seen = inside.load(Ordering::Relaxed);
                inside.store(seen + 1, Ordering::Relaxed);
            }
        }
        Ok(())
    })?;

    let counted = inside.into_inner();
    debug!(counted, "unsynchronized counter read");
    Ok(vec![PartialResult::new(counted, total_trials(items))?])
}
