use std::env;
use std::path::PathBuf;

use crate::error::{EstimateError, Result};
use crate::strategy::isolated;

pub const SEED_ENV: &str = "MONTE_CARLO_PI_SEED";
pub const WORKER_ENV: &str = "MONTE_CARLO_PI_WORKER";

/// Knobs shared by every strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Base seed; per-worker seeds are derived from it. A fresh one is drawn
    /// per run when unset.
    pub seed: Option<u64>,
    /// Executable launched for each isolated-process worker. When unset,
    /// the running binary is used only if it called `isolated::init`.
    pub worker_program: Option<PathBuf>,
    /// Stack size for worker threads, in bytes. Platform default when unset.
    pub worker_stack_size: Option<usize>,
}

impl EstimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `MONTE_CARLO_PI_SEED` and `MONTE_CARLO_PI_WORKER`.
    pub fn from_env() -> Result<Self> {
        let seed = match env::var(SEED_ENV) {
            Ok(raw) => Some(parse_seed(&raw)?),
            Err(env::VarError::NotPresent) => None,
            Err(err) => return Err(EstimateError::config(format!("{SEED_ENV}: {err}"))),
        };
        let worker_program = env::var_os(WORKER_ENV).map(PathBuf::from);
        Ok(Self {
            seed,
            worker_program,
            worker_stack_size: None,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    pub(crate) fn resolve_worker_program(&self) -> Result<PathBuf> {
        self.resolve_worker_program_with(isolated::is_hooked())
    }

    fn resolve_worker_program_with(&self, hooked: bool) -> Result<PathBuf> {
        match &self.worker_program {
            Some(program) => Ok(program.clone()),
            None if hooked => env::current_exe().map_err(|err| {
                EstimateError::config(format!("cannot locate worker executable: {err}"))
            }),
            None => Err(EstimateError::config(format!(
                "no worker program for isolated processes: set {WORKER_ENV} or call \
                 isolated::init() at the top of main"
            ))),
        }
    }
}

fn parse_seed(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|err| EstimateError::config(format!("{SEED_ENV}={raw:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = EstimatorConfig::new()
            .with_seed(42)
            .with_worker_program("/usr/local/bin/monte_carlo_pi");
        assert_eq!(config.seed, Some(42));
        assert_eq!(
            config.resolve_worker_program().unwrap(),
            PathBuf::from("/usr/local/bin/monte_carlo_pi")
        );
    }

    #[test]
    fn hooked_process_is_its_own_worker() {
        let program = EstimatorConfig::default()
            .resolve_worker_program_with(true)
            .unwrap();
        assert_eq!(program, env::current_exe().unwrap());
    }

    #[test]
    fn unhooked_process_needs_a_worker_program() {
        let err = EstimatorConfig::default()
            .resolve_worker_program_with(false)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains(WORKER_ENV));
    }

    #[test]
    fn seed_parsing() {
        assert_eq!(parse_seed(" 123 ").unwrap(), 123);
        assert!(parse_seed("-1").unwrap_err().is_config());
        assert!(parse_seed("abc").unwrap_err().is_config());
    }
}
