//! Error types for π estimation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EstimateError>;

/// Failures surfaced by an estimation run.
///
/// Both kinds are fatal to the call that produced them. The unsynchronized
/// counter losing increments is not an error and never shows up here.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// Invalid point budget, worker count or configuration value.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A sampling unit terminated abnormally or returned garbage. `worker`
    /// is `None` when the failure could not be pinned on one unit.
    #[error("{} failed: {reason}", worker_label(.worker))]
    WorkerFailure {
        worker: Option<usize>,
        reason: String,
    },
}

fn worker_label(worker: &Option<usize>) -> String {
    match worker {
        Some(worker) => format!("worker {worker}"),
        None => "unidentified worker".to_string(),
    }
}

impl EstimateError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn worker(worker: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            worker: Some(worker),
            reason: reason.into(),
        }
    }

    pub fn unattributed(reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            worker: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    #[must_use]
    pub fn is_worker_failure(&self) -> bool {
        matches!(self, Self::WorkerFailure { .. })
    }

    /// Worker the failure was pinned on, if any.
    #[must_use]
    pub fn failed_worker(&self) -> Option<usize> {
        match self {
            Self::WorkerFailure { worker, .. } => *worker,
            Self::Config { .. } => None,
        }
    }
}
