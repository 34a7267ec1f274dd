use std::collections::HashMap;

use tokio::runtime::Builder;
use tokio::task::{self, JoinSet};
use tracing::debug;

use super::{enter, panic_message, Phase};
use crate::error::{EstimateError, Result};
use crate::sampler::{PartialResult, WorkItem};

/// Runs every work item on a blocking pool capped at `pool_size` threads.
///
/// Each job owns its item and returns its own count; nothing mutable is
/// shared between jobs. Results are collected in completion order.
pub fn run(
    items: &[WorkItem],
    seed: u64,
    pool_size: usize,
    stack_size: Option<usize>,
) -> Result<Vec<PartialResult>> {
    run_jobs(items, pool_size, stack_size, move |item| item.run(seed))
}

fn run_jobs<F>(
    items: &[WorkItem],
    pool_size: usize,
    stack_size: Option<usize>,
    job: F,
) -> Result<Vec<PartialResult>>
where
    F: Fn(WorkItem) -> PartialResult + Clone + Send + 'static,
{
    if pool_size == 0 {
        return Err(EstimateError::config("pool size must be positive"));
    }
    let mut builder = Builder::new_current_thread();
    builder.max_blocking_threads(pool_size).thread_name("pi-pool");
    if let Some(bytes) = stack_size {
        builder.thread_stack_size(bytes);
    }
    let runtime = builder
        .build()
        .map_err(|err| EstimateError::config(format!("cannot start worker pool: {err}")))?;

    runtime.block_on(async {
        enter(Phase::Dispatching);
        let mut tasks = JoinSet::new();
        let mut owners = HashMap::with_capacity(items.len());
        for item in items.iter().copied() {
            let job = job.clone();
            // spawn_blocking panics when the OS refuses a pool thread; inside
            // this task that panic is caught and reported against the item.
            let handle = tasks.spawn(async move { task::spawn_blocking(move || job(item)).await });
            owners.insert(handle.id(), item.worker);
        }
        enter(Phase::WorkersRunning);

        enter(Phase::Joining);
        let mut partials = Vec::with_capacity(items.len());
        while let Some(finished) = tasks.join_next_with_id().await {
            let (id, joined) = match finished {
                Ok((id, joined)) => (id, joined),
                Err(err) => (err.id(), Err(err)),
            };
            let worker = owners.get(&id).copied();
            match joined {
                Ok(partial) => {
                    debug!(?worker, hits = partial.hits(), "pool job finished");
                    partials.push(partial);
                }
                Err(err) => {
                    let reason = if err.is_panic() {
                        panic_message(&*err.into_panic())
                    } else {
                        err.to_string()
                    };
                    return Err(match worker {
                        Some(worker) => EstimateError::worker(worker, reason),
                        None => EstimateError::unattributed(reason),
                    });
                }
            }
        }
        Ok(partials)
    })
}
