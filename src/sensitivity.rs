//! Sensitivity Curve Computer: sweeps the deviation factor over a range and
//! reports, for each factor, the share of the whole population the
//! Deviation Detector would flag. Used to pick working k values.

use crate::error::SurveilError;
use crate::stats::{self, Direction};
use crate::types::{DowntimeRow, OrderView, SweepPoint};

/// Half-open factor range `[start, stop)` walked in `step` increments.
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Sweep {
    /// Default range for downtime calibration.
    pub const DOWNTIME: Sweep = Sweep { start: 0.0, stop: 1.0, step: 0.001 };
    /// Default range for order-value calibration.
    pub const ORDER_VALUE: Sweep = Sweep { start: 0.0, stop: 4.0, step: 0.01 };

    fn validate(&self) -> Result<(), SurveilError> {
        if !self.start.is_finite() || !self.stop.is_finite() || !self.step.is_finite() {
            return Err(SurveilError::invalid("sweep bounds must be finite"));
        }
        if self.start < 0.0 {
            return Err(SurveilError::invalid(format!(
                "sweep start must be non-negative, got {}",
                self.start
            )));
        }
        if self.stop < self.start {
            return Err(SurveilError::invalid(format!(
                "sweep stop {} is below start {}",
                self.stop, self.start
            )));
        }
        if self.step <= 0.0 {
            return Err(SurveilError::invalid(format!(
                "sweep step must be positive, got {}",
                self.step
            )));
        }
        Ok(())
    }

    fn factors(&self) -> impl Iterator<Item = f64> + '_ {
        let count = ((self.stop - self.start) / self.step).ceil() as usize;
        (0..count).map(move |i| self.start + i as f64 * self.step)
    }
}

/// Core sweep over an already-derived numeric series. `population` is the
/// full batch size: the original report divides by the whole batch even
/// when the evaluated series is a filtered subset, and callers rely on
/// those percentages. An empty population yields 0% at every factor.
pub fn sensitivity_curve(
    values: &[f64],
    population: usize,
    sweep: &Sweep,
    direction: Direction,
) -> Result<Vec<SweepPoint>, SurveilError> {
    sweep.validate()?;

    // One pass for the statistics; they do not change across factors.
    let moments = match (stats::mean(values), stats::sample_std(values)) {
        (Some(m), Some(s)) => Some((m, s)),
        _ => None,
    };

    let points = sweep
        .factors()
        .map(|factor| {
            let flagged = match moments {
                Some((mean, std)) => values
                    .iter()
                    .filter(|&&v| stats::outside(v, mean, factor * std, direction))
                    .count(),
                None => 0,
            };
            let pct_flagged = if population == 0 {
                0.0
            } else {
                flagged as f64 * 100.0 / population as f64
            };
            SweepPoint { factor, pct_flagged }
        })
        .collect();
    Ok(points)
}

/// Low-direction sweep over the batch's strictly positive downtimes,
/// expressed as a share of the whole batch.
pub fn downtime_sweep(
    rows: &[DowntimeRow],
    sweep: &Sweep,
) -> Result<Vec<SweepPoint>, SurveilError> {
    let positives: Vec<f64> = rows
        .iter()
        .map(|r| r.time_diff)
        .filter(|&td| td > 0.0)
        .collect();
    sensitivity_curve(&positives, rows.len(), sweep, Direction::Low)
}

/// High-direction sweep over the batch's order values.
pub fn amount_sweep(views: &[OrderView], sweep: &Sweep) -> Result<Vec<SweepPoint>, SurveilError> {
    let values: Vec<f64> = views.iter().map(|v| v.order_amount).collect();
    sensitivity_curve(&values, views.len(), sweep, Direction::High)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_non_increasing_in_the_factor() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 50.0, 60.0];
        let sweep = Sweep { start: 0.0, stop: 3.0, step: 0.1 };
        let points =
            sensitivity_curve(&values, values.len(), &sweep, Direction::High).unwrap();
        for pair in points.windows(2) {
            assert!(pair[1].pct_flagged <= pair[0].pct_flagged);
        }
    }

    #[test]
    fn factor_zero_flags_everything_above_the_mean() {
        let values = [1.0, 1.0, 10.0];
        let points =
            sensitivity_curve(&values, values.len(), &Sweep::ORDER_VALUE, Direction::High)
                .unwrap();
        assert_eq!(points[0].factor, 0.0);
        // One of three values sits above the mean.
        assert!((points[0].pct_flagged - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_population_yields_zero_percent_everywhere() {
        let points =
            sensitivity_curve(&[], 0, &Sweep::DOWNTIME, Direction::Low).unwrap();
        assert_eq!(points.len(), 1000);
        assert!(points.iter().all(|p| p.pct_flagged == 0.0));
    }

    #[test]
    fn malformed_sweeps_are_rejected() {
        let values = [1.0, 2.0];
        for sweep in [
            Sweep { start: 0.0, stop: 1.0, step: 0.0 },
            Sweep { start: 0.0, stop: 1.0, step: -0.1 },
            Sweep { start: 2.0, stop: 1.0, step: 0.1 },
            Sweep { start: -1.0, stop: 1.0, step: 0.1 },
        ] {
            let result = sensitivity_curve(&values, 2, &sweep, Direction::High);
            assert!(matches!(
                result,
                Err(crate::error::SurveilError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn default_ranges_have_expected_point_counts() {
        let values = [1.0, 2.0, 3.0];
        let down = sensitivity_curve(&values, 3, &Sweep::DOWNTIME, Direction::Low).unwrap();
        assert_eq!(down.len(), 1000);
        let amount =
            sensitivity_curve(&values, 3, &Sweep::ORDER_VALUE, Direction::High).unwrap();
        assert_eq!(amount.len(), 400);
    }
}
