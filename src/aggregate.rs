use crate::error::{EstimateError, Result};
use crate::sampler::PartialResult;

/// Reduces partial hit counts to `4 * Σhits / total_points`.
///
/// The denominator is the requested budget, not the number of trials that
/// actually ran, so truncated remainders count as misses.
pub fn aggregate(partials: &[PartialResult], total_points: u64) -> Result<f64> {
    if total_points == 0 {
        return Err(EstimateError::config("total points must be positive"));
    }
    let trials: u64 = partials.iter().map(PartialResult::trials).sum();
    if trials > total_points {
        return Err(EstimateError::config(format!(
            "partial results cover {trials} trials, more than the {total_points} point budget"
        )));
    }
    let total_inside: u64 = partials.iter().map(PartialResult::hits).sum();
    Ok(4.0 * total_inside as f64 / total_points as f64)
}
