//! Deviation Detector: flags records whose order value sits outside the
//! k-deviation acceptance band of their population. The population is the
//! whole batch, one user's history, or every user's own history depending
//! on the entry point.

use std::collections::BTreeMap;

use crate::error::SurveilError;
use crate::stats::{self, Band, Direction};
use crate::types::{AmountFlag, Outcome, OrderView, Shortfall};

pub(crate) fn ensure_factor(k: f64) -> Result<(), SurveilError> {
    if !k.is_finite() || k < 0.0 {
        return Err(SurveilError::invalid(format!(
            "deviation factor must be a non-negative number, got {k}"
        )));
    }
    Ok(())
}

fn flag(view: &OrderView) -> AmountFlag {
    AmountFlag {
        created_at: view.created_at,
        user_id: view.user_id.clone(),
        order_id: view.order_id.clone(),
        order_amount: view.order_amount,
    }
}

/// Evaluate one population of views against its own mean/stddev. Returns
/// the shortfall when the statistic cannot be computed.
fn evaluate<'a>(
    views: &[&'a OrderView],
    k: f64,
    direction: Direction,
) -> Result<Vec<&'a OrderView>, Shortfall> {
    if views.is_empty() {
        return Err(Shortfall::EmptyPopulation);
    }
    let values: Vec<f64> = views.iter().map(|v| v.order_amount).collect();
    let mean = stats::mean(&values).ok_or(Shortfall::EmptyPopulation)?;
    let std = stats::sample_std(&values).ok_or(Shortfall::DegenerateStddev)?;
    let dev = k * std;
    Ok(views
        .iter()
        .filter(|v| stats::outside(v.order_amount, mean, dev, direction))
        .copied()
        .collect())
}

/// Records whose order value exceeds the whole batch's mean by more than
/// k standard deviations. Output ordered by timestamp.
pub fn order_amount_outliers(
    views: &[OrderView],
    k: f64,
) -> Result<Outcome<AmountFlag>, SurveilError> {
    ensure_factor(k)?;
    let refs: Vec<&OrderView> = views.iter().collect();
    match evaluate(&refs, k, Direction::High) {
        Err(shortfall) => Ok(Outcome::Undetermined(shortfall)),
        Ok(mut flagged) => {
            flagged.sort_by_key(|v| v.created_at);
            Ok(Outcome::from_rows(flagged.into_iter().map(flag).collect()))
        }
    }
}

/// Same rule restricted to a single user's own history.
pub fn user_order_amount_outliers(
    views: &[OrderView],
    user_id: &str,
    k: f64,
) -> Result<Outcome<AmountFlag>, SurveilError> {
    ensure_factor(k)?;
    let refs: Vec<&OrderView> = views.iter().filter(|v| v.user_id == user_id).collect();
    match evaluate(&refs, k, Direction::High) {
        Err(shortfall) => Ok(Outcome::Undetermined(shortfall)),
        Ok(mut flagged) => {
            flagged.sort_by_key(|v| v.created_at);
            Ok(Outcome::from_rows(flagged.into_iter().map(flag).collect()))
        }
    }
}

/// Every user evaluated against their own history. Users with fewer than
/// two records carry no sample deviation and cannot contribute flags; the
/// detector is undetermined only when no user at all could be evaluated.
/// Output ordered by user, then timestamp.
pub fn per_user_order_amount_outliers(
    views: &[OrderView],
    k: f64,
) -> Result<Outcome<AmountFlag>, SurveilError> {
    ensure_factor(k)?;
    if views.is_empty() {
        return Ok(Outcome::Undetermined(Shortfall::EmptyPopulation));
    }

    let mut by_user: BTreeMap<&str, Vec<&OrderView>> = BTreeMap::new();
    for v in views {
        by_user.entry(v.user_id.as_str()).or_default().push(v);
    }

    let mut rows = Vec::new();
    let mut any_evaluable = false;
    for group in by_user.values() {
        match evaluate(group, k, Direction::High) {
            Err(_) => continue,
            Ok(mut flagged) => {
                any_evaluable = true;
                flagged.sort_by_key(|v| v.created_at);
                rows.extend(flagged.into_iter().map(flag));
            }
        }
    }
    if !any_evaluable {
        return Ok(Outcome::Undetermined(Shortfall::DegenerateStddev));
    }
    Ok(Outcome::from_rows(rows))
}

/// Plain absolute rule: order value strictly greater than `max`.
pub fn amount_over_threshold(
    views: &[OrderView],
    max: f64,
) -> Result<Outcome<AmountFlag>, SurveilError> {
    if !max.is_finite() || max <= 0.0 {
        return Err(SurveilError::invalid(format!(
            "amount threshold must be a positive number, got {max}"
        )));
    }
    if views.is_empty() {
        return Ok(Outcome::Undetermined(Shortfall::EmptyPopulation));
    }
    let mut flagged: Vec<&OrderView> = views.iter().filter(|v| v.order_amount > max).collect();
    flagged.sort_by_key(|v| v.created_at);
    Ok(Outcome::from_rows(flagged.into_iter().map(flag).collect()))
}

/// Acceptance band over the batch's order values, for reporting. Lower
/// bound clamps at 0 since order value is non-negative by definition.
/// None when the population is too small to carry a deviation.
pub fn amount_band(views: &[OrderView], k: f64) -> Result<Option<Band>, SurveilError> {
    ensure_factor(k)?;
    let values: Vec<f64> = views.iter().map(|v| v.order_amount).collect();
    Ok(stats::band(&values, k, true))
}
