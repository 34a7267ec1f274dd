//! One child process per worker.
//!
//! Children share no memory with the coordinator or each other. Each one is
//! a worker program run as `worker --worker <i> --trials <n> --seed <s>`
//! with [`WORKER_MARKER_ENV`] set, and answers with a single
//! `"<hits> <trials>"` line on stdout.
//!
//! Any program can act as its own worker by calling [`init`] at the top of
//! `main`:
//!
//! ```no_run
//! fn main() {
//!     monte_carlo_pi::strategy::isolated::init();
//!     let result = monte_carlo_pi::estimate_pi(
//!         monte_carlo_pi::Strategy::IsolatedProcess,
//!         1_000_000,
//!         4,
//!     );
//!     println!("{result:?}");
//! }
//! ```

use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::process::{self, Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{debug, warn};

use super::{enter, Phase};
use crate::error::{EstimateError, Result};
use crate::sampler::{PartialResult, WorkItem};

pub const WORKER_SUBCOMMAND: &str = "worker";

/// Present in the environment of every worker child.
pub const WORKER_MARKER_ENV: &str = "MONTE_CARLO_PI_ISOLATED_WORKER";

static HOOKED: AtomicBool = AtomicBool::new(false);

/// Makes the running executable usable as its own worker program.
///
/// Inside a worker child this serves the assigned item, prints the reply
/// line and exits the process. Anywhere else it returns immediately, and
/// later isolated-process runs without an explicit worker program re-launch
/// the current executable.
pub fn init() {
    if env::var_os(WORKER_MARKER_ENV).is_some() {
        let code = match serve_args(env::args_os()) {
            Ok(line) => {
                println!("{line}");
                0
            }
            Err(err) => {
                eprintln!("error: {err}");
                2
            }
        };
        process::exit(code);
    }
    HOOKED.store(true, Ordering::Release);
}

/// Whether [`init`] has run in this process.
pub fn is_hooked() -> bool {
    HOOKED.load(Ordering::Acquire)
}

#[derive(Parser)]
struct WorkerArgs {
    #[arg(long)]
    worker: usize,

    #[arg(long)]
    trials: u64,

    #[arg(long)]
    seed: u64,
}

/// Serves a worker command line: `<program> worker --worker <i> --trials <n> --seed <s>`.
pub fn serve_args<I, T>(args: I) -> Result<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let program = args.next().unwrap_or_default();
    match args.next() {
        Some(subcommand) if subcommand == WORKER_SUBCOMMAND => {}
        other => {
            return Err(EstimateError::config(format!(
                "expected `{WORKER_SUBCOMMAND}` subcommand, got {other:?}"
            )))
        }
    }
    let parsed = WorkerArgs::try_parse_from(std::iter::once(program).chain(args))
        .map_err(|err| EstimateError::config(err.to_string()))?;
    let item = WorkItem {
        worker: parsed.worker,
        trial_count: parsed.trials,
    };
    Ok(serve(item, parsed.seed))
}

pub fn run(items: &[WorkItem], seed: u64, program: &Path) -> Result<Vec<PartialResult>> {
    enter(Phase::Dispatching);
    let mut children: Vec<(WorkItem, Child)> = Vec::with_capacity(items.len());
    for item in items {
        match spawn(program, item, seed) {
            Ok(child) => children.push((*item, child)),
            Err(err) => {
                reap(children);
                return Err(err);
            }
        }
    }
    enter(Phase::WorkersRunning);

    enter(Phase::Joining);
    let mut partials = Vec::with_capacity(children.len());
    let mut failure = None;
    for (item, child) in children {
        match collect(item, child) {
            Ok(partial) => partials.push(partial),
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(partials),
    }
}

fn spawn(program: &Path, item: &WorkItem, seed: u64) -> Result<Child> {
    let child = Command::new(program)
        .arg(WORKER_SUBCOMMAND)
        .arg("--worker")
        .arg(item.worker.to_string())
        .arg("--trials")
        .arg(item.trial_count.to_string())
        .arg("--seed")
        .arg(seed.to_string())
        .env(WORKER_MARKER_ENV, "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|err| {
            EstimateError::worker(
                item.worker,
                format!("cannot spawn {}: {err}", program.display()),
            )
        })?;
    debug!(worker = item.worker, pid = child.id(), "worker process started");
    Ok(child)
}

fn collect(item: WorkItem, child: Child) -> Result<PartialResult> {
    let output = child
        .wait_with_output()
        .map_err(|err| EstimateError::worker(item.worker, format!("wait failed: {err}")))?;
    if !output.status.success() {
        return Err(EstimateError::worker(
            item.worker,
            format!("process exited with {}", output.status),
        ));
    }
    let line = String::from_utf8_lossy(&output.stdout);
    let partial = decode(&line).map_err(|reason| EstimateError::worker(item.worker, reason))?;
    if partial.trials() != item.trial_count {
        return Err(EstimateError::worker(
            item.worker,
            format!(
                "ran {} trials, {} were assigned",
                partial.trials(),
                item.trial_count
            ),
        ));
    }
    Ok(partial)
}

fn reap(children: Vec<(WorkItem, Child)>) {
    for (item, mut child) in children {
        if let Err(err) = child.kill() {
            warn!(worker = item.worker, %err, "could not kill worker process");
        }
        if let Err(err) = child.wait() {
            warn!(worker = item.worker, %err, "could not reap worker process");
        }
    }
}

/// Child-side entry point: samples the item and formats the reply line.
pub fn serve(item: WorkItem, seed: u64) -> String {
    encode(&item.run(seed))
}

pub fn encode(partial: &PartialResult) -> String {
    format!("{} {}", partial.hits(), partial.trials())
}

pub fn decode(line: &str) -> std::result::Result<PartialResult, String> {
    let mut fields = line.split_whitespace();
    let (Some(hits), Some(trials), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("malformed reply {:?}", line.trim()));
    };
    let hits: u64 = hits
        .parse()
        .map_err(|err| format!("bad hit count {hits:?}: {err}"))?;
    let trials: u64 = trials
        .parse()
        .map_err(|err| format!("bad trial count {trials:?}: {err}"))?;
    PartialResult::new(hits, trials).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_line_decodes() {
        let partial = decode("785 1000\n").unwrap();
        assert_eq!(partial.hits(), 785);
        assert_eq!(partial.trials(), 1000);
    }

    #[test]
    fn served_line_matches_in_process_sampling() {
        let item = WorkItem {
            worker: 2,
            trial_count: 20_000,
        };
        assert_eq!(decode(&serve(item, 77)).unwrap(), item.run(77));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode("").is_err());
        assert!(decode("12").is_err());
        assert!(decode("1 2 3").is_err());
        assert!(decode("x 2").is_err());
        assert!(decode("5 2").is_err());
    }

    #[test]
    fn worker_command_line_is_served() {
        let line = serve_args([
            "monte_carlo_pi",
            "worker",
            "--worker",
            "1",
            "--trials",
            "3000",
            "--seed",
            "6",
        ])
        .unwrap();
        let item = WorkItem {
            worker: 1,
            trial_count: 3_000,
        };
        assert_eq!(decode(&line).unwrap(), item.run(6));
    }

    #[test]
    fn worker_command_line_needs_the_subcommand() {
        assert!(serve_args(["app", "--worker", "1"]).unwrap_err().is_config());
        assert!(serve_args(["app", "worker", "--trials", "x"])
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn killed_children_are_reaped() {
        let child = Command::new(env::current_exe().unwrap())
            .arg("--list")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let item = WorkItem {
            worker: 0,
            trial_count: 1,
        };
        reap(vec![(item, child)]);
    }

    #[test]
    fn missing_program_is_worker_failure() {
        let items = [WorkItem {
            worker: 0,
            trial_count: 10,
        }];
        let err = run(&items, 1, Path::new("/nonexistent/monte_carlo_pi")).unwrap_err();
        assert!(err.is_worker_failure());
    }
}
