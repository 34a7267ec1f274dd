//! The four ways of spreading the sampling workload.
//!
//! | strategy           | unit          | shared mutable state         |
//! |--------------------|---------------|------------------------------|
//! | `IsolatedProcess`  | OS process    | none, results over a pipe    |
//! | `UnsyncShared`     | OS thread     | one counter, no exclusion    |
//! | `Pooled`           | pool thread   | none, results returned       |
//! | `LockGuarded`      | OS thread     | one counter behind a mutex   |

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::thread::{self, ScopedJoinHandle};

use crate::error::{EstimateError, Result};
use crate::sampler::WorkItem;

pub mod isolated;
pub mod locked;
pub mod pooled;
pub mod unsync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    IsolatedProcess,
    UnsyncShared,
    Pooled,
    LockGuarded,
}

impl Strategy {
    /// Comparison order used by the `compare` command.
    pub const ALL: [Strategy; 4] = [
        Strategy::IsolatedProcess,
        Strategy::UnsyncShared,
        Strategy::Pooled,
        Strategy::LockGuarded,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::IsolatedProcess => "isolated-process",
            Strategy::UnsyncShared => "unsync-shared",
            Strategy::Pooled => "pooled",
            Strategy::LockGuarded => "lock-guarded",
        }
    }

    /// Whether the final count is guaranteed to equal the true hit count.
    pub fn is_exact(self) -> bool {
        !matches!(self, Strategy::UnsyncShared)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = EstimateError;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| {
                EstimateError::config(format!(
                    "unknown strategy {s:?}, expected one of: isolated-process, unsync-shared, pooled, lock-guarded"
                ))
            })
    }
}

/// Lifecycle every estimation walks through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Partitioning,
    Dispatching,
    WorkersRunning,
    Joining,
    Aggregating,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Partitioning => "partitioning",
            Phase::Dispatching => "dispatching",
            Phase::WorkersRunning => "workers-running",
            Phase::Joining => "joining",
            Phase::Aggregating => "aggregating",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

pub(crate) fn enter(phase: Phase) {
    tracing::debug!(%phase, "phase");
}

/// Runs `body` once per item, each on its own scoped OS thread.
///
/// A thread the OS refuses to create is a failure of that worker. Spawning
/// stops there, and the threads already running are joined before the error
/// is returned.
pub(crate) fn run_scoped<F>(items: &[WorkItem], stack_size: Option<usize>, body: F) -> Result<()>
where
    F: Fn(&WorkItem) -> Result<()> + Sync,
{
    thread::scope(|scope| {
        let body = &body;
        let mut handles = Vec::with_capacity(items.len());
        let mut refused = None;
        for item in items {
            let mut builder = thread::Builder::new().name(format!("pi-worker-{}", item.worker));
            if let Some(bytes) = stack_size {
                builder = builder.stack_size(bytes);
            }
            match builder.spawn_scoped(scope, move || body(item)) {
                Ok(handle) => handles.push((item.worker, handle)),
                Err(err) => {
                    refused = Some(EstimateError::worker(
                        item.worker,
                        format!("cannot spawn thread: {err}"),
                    ));
                    break;
                }
            }
        }
        enter(Phase::WorkersRunning);

        enter(Phase::Joining);
        let joined = join_workers(handles);
        match refused {
            Some(err) => Err(err),
            None => joined.map(|_| ()),
        }
    })
}

/// Joins every handle, even after one has failed, and reports the first
/// failure. Leaving a panicked handle unjoined would make `thread::scope`
/// re-panic on exit.
pub(crate) fn join_workers<T>(
    handles: Vec<(usize, ScopedJoinHandle<'_, Result<T>>)>,
) -> Result<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    let mut failure = None;
    for (worker, handle) in handles {
        match handle.join() {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(err)) => {
                failure.get_or_insert(err);
            }
            Err(payload) => {
                failure.get_or_insert(EstimateError::worker(worker, panic_message(&*payload)));
            }
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn names_round_trip() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn unknown_name_is_config_error() {
        assert!("semaphore".parse::<Strategy>().unwrap_err().is_config());
    }

    #[test]
    fn only_unsync_is_inexact() {
        let inexact: Vec<_> = Strategy::ALL.into_iter().filter(|s| !s.is_exact()).collect();
        assert_eq!(inexact, vec![Strategy::UnsyncShared]);
    }

    #[test]
    fn panicking_thread_becomes_worker_failure() {
        let outcome = thread::scope(|scope| {
            let handles = (0..3)
                .map(|worker| {
                    let handle = scope.spawn(move || {
                        if worker == 1 {
                            panic!("rng exhausted");
                        }
                        Ok::<_, EstimateError>(worker)
                    });
                    (worker, handle)
                })
                .collect();
            join_workers(handles)
        });
        match outcome.unwrap_err() {
            EstimateError::WorkerFailure { worker, reason } => {
                assert_eq!(worker, Some(1));
                assert!(reason.contains("rng exhausted"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // A stack no address space can hold makes every spawn fail.
    #[cfg(target_pointer_width = "64")]
    #[test]
    fn refused_thread_becomes_worker_failure() {
        let items = crate::partition::partition(1_000, 4).unwrap();
        let err = run_scoped(&items, Some(1 << 60), |_| Ok(())).unwrap_err();
        assert_eq!(err.failed_worker(), Some(0));
        assert!(err.to_string().contains("cannot spawn thread"));
    }

    #[test]
    fn scoped_workers_all_run() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let items = crate::partition::partition(100, 5).unwrap();
        let seen = AtomicUsize::new(0);
        run_scoped(&items, None, |item| {
            seen.fetch_add(item.worker + 1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen.into_inner(), 15);
    }
}
