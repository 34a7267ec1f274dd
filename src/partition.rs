use crate::error::{EstimateError, Result};
use crate::sampler::WorkItem;

/// Splits `total_points` evenly across `worker_count` workers.
///
/// Every worker gets `total_points / worker_count` trials. The remainder is
/// dropped rather than handed to the last worker, so every strategy samples
/// exactly the same budget and their estimates stay comparable.
pub fn partition(total_points: u64, worker_count: usize) -> Result<Vec<WorkItem>> {
    if worker_count == 0 {
        return Err(EstimateError::config("worker count must be positive"));
    }
    let samples_per_worker = total_points / worker_count as u64;
    Ok((0..worker_count)
        .map(|worker| WorkItem {
            worker,
            trial_count: samples_per_worker,
        })
        .collect())
}

/// Sum of trials over a partition.
pub fn total_trials(items: &[WorkItem]) -> u64 {
    items.iter().map(|item| item.trial_count).sum()
}
