//! Population statistics shared by the detectors: arithmetic mean, sample
//! standard deviation (n−1 denominator) and the deviation band around them.

use serde::Serialize;

/// Which side of the acceptance band a detector flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Flag values more than k deviations above the mean.
    High,
    /// Flag values more than k deviations below the mean.
    Low,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation. None for fewer than two values: there is no
/// sample variance over a single observation.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sq_diff: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sq_diff / (values.len() - 1) as f64).sqrt())
}

/// Acceptance band `[mean − k·std, mean + k·std]` for reporting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Band {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Band over a population. `clamp_lower` pins the lower bound at 0 for
/// quantities that are non-negative by definition (order value, downtime).
pub fn band(values: &[f64], k: f64, clamp_lower: bool) -> Option<Band> {
    let m = mean(values)?;
    let dev = k * sample_std(values)?;
    let lower = if clamp_lower { (m - dev).max(0.0) } else { m - dev };
    Some(Band { mean: m, lower, upper: m + dev })
}

/// Strict band-exit predicate: high flags `value − mean > dev`, low flags
/// `value < mean − dev`.
pub fn outside(value: f64, mean: f64, dev: f64, direction: Direction) -> bool {
    match direction {
        Direction::High => value - mean > dev,
        Direction::Low => value < mean - dev,
    }
}
