//! `estimate_pi` picks its configuration up from the environment, so these
//! run in their own test binary.

use std::env;

use monte_carlo_pi::config::{SEED_ENV, WORKER_ENV};
use monte_carlo_pi::{estimate_pi, partition, Strategy};

const WORKER_BIN: &str = env!("CARGO_BIN_EXE_monte_carlo_pi");

#[test]
fn isolated_process_through_the_default_entry_point() {
    env::set_var(WORKER_ENV, WORKER_BIN);
    env::set_var(SEED_ENV, "2718");

    let result = estimate_pi(Strategy::IsolatedProcess, 1_000, 2).unwrap();

    let expected: u64 = partition(1_000, 2)
        .unwrap()
        .iter()
        .map(|item| item.run(2718).hits())
        .sum();
    assert_eq!(result.hits, expected);
    assert_eq!(result.seed, 2718);
    assert!((0.0..=4.0).contains(&result.pi_estimate));
}
