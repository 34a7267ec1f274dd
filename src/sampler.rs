use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EstimateError, Result};

// Consistent seed pattern: worker i starts at base + i * stride.
const SEED_STRIDE: u64 = 67_890;

/// Seed of `worker`'s generator for a run seeded with `base`.
pub fn seed_for(base: u64, worker: usize) -> u64 {
    base.wrapping_add((worker as u64).wrapping_mul(SEED_STRIDE))
}

/// Draws one point in the unit square and reports whether it lands inside
/// the quarter circle.
#[inline]
pub fn hit<R: Rng + ?Sized>(rng: &mut R) -> bool {
    let x: f64 = rng.gen();
    let y: f64 = rng.gen();
    x * x + y * y <= 1.0
}

/// Counts hits over `trials` independent draws from `rng`.
pub fn sample<R: Rng + ?Sized>(trials: u64, rng: &mut R) -> u64 {
    let mut inside = 0;
    for _ in 0..trials {
        if hit(rng) {
            inside += 1;
        }
    }
    inside
}

/// Hits and trials reported back by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialResult {
    hits: u64,
    trials: u64,
}

impl PartialResult {
    pub fn new(hits: u64, trials: u64) -> Result<Self> {
        if hits > trials {
            return Err(EstimateError::config(format!(
                "partial result reports {hits} hits out of {trials} trials"
            )));
        }
        Ok(Self { hits, trials })
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }
}

/// Slice of the point budget owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub worker: usize,
    pub trial_count: u64,
}

impl WorkItem {
    /// The worker's own generator. Every strategy derives it the same way,
    /// so a fixed `base` yields the same point sequence everywhere.
    pub fn rng(&self, base: u64) -> StdRng {
        StdRng::seed_from_u64(seed_for(base, self.worker))
    }

    /// Runs the bulk sampler over this item.
    pub fn run(&self, base: u64) -> PartialResult {
        let mut rng = self.rng(base);
        let hits = sample(self.trial_count, &mut rng);
        PartialResult {
            hits,
            trials: self.trial_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trials_yields_zero_hits() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(sample(0, &mut rng), 0);
    }

    #[test]
    fn hits_never_exceed_trials() {
        let mut rng = StdRng::seed_from_u64(11);
        for trials in [1, 10, 1_000, 50_000] {
            assert!(sample(trials, &mut rng) <= trials);
        }
    }

    #[test]
    fn hit_ratio_approaches_quarter_circle_area() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 200_000;
        let ratio = sample(trials, &mut rng) as f64 / trials as f64;
        approx::assert_abs_diff_eq!(ratio, std::f64::consts::FRAC_PI_4, epsilon = 0.01);
    }

    #[test]
    fn per_point_loop_matches_bulk_sample() {
        let item = WorkItem {
            worker: 3,
            trial_count: 10_000,
        };
        let mut rng = item.rng(99);
        let stepwise = (0..item.trial_count).filter(|_| hit(&mut rng)).count() as u64;
        assert_eq!(item.run(99).hits(), stepwise);
    }

    #[test]
    fn workers_get_distinct_streams() {
        assert_ne!(seed_for(5, 0), seed_for(5, 1));
        let first = WorkItem { worker: 0, trial_count: 1 }.rng(5).gen::<u64>();
        let second = WorkItem { worker: 1, trial_count: 1 }.rng(5).gen::<u64>();
        assert_ne!(first, second);
    }

    #[test]
    fn partial_result_rejects_more_hits_than_trials() {
        assert!(PartialResult::new(3, 2).unwrap_err().is_config());
        assert!(PartialResult::new(2, 2).is_ok());
    }
}
