//! Monte Carlo estimation of π under four concurrency disciplines.
//!
//! Every strategy samples the same budget, split the same way, with the same
//! per-worker random streams. What differs is how partial counts travel back
//! to the coordinator:
//!
//! - [`Strategy::IsolatedProcess`]: child processes reply over a pipe.
//! - [`Strategy::UnsyncShared`]: threads bump one counter without a lock and
//!   lose updates under contention.
//! - [`Strategy::Pooled`]: a fixed blocking pool returns per-job counts.
//! - [`Strategy::LockGuarded`]: threads bump one counter behind a mutex.
//!
//! With a fixed seed the three exact strategies report identical hit counts.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod estimator;
pub mod partition;
pub mod sampler;
pub mod strategy;

pub use aggregate::aggregate;
pub use config::EstimatorConfig;
pub use error::{EstimateError, Result};
pub use estimator::{estimate_pi, EstimationResult, Estimator};
pub use partition::partition;
pub use sampler::{sample, PartialResult, WorkItem};
pub use strategy::{Phase, Strategy};
