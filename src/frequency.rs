//! High-Frequency Pair Detector: bursts of rapid repeat activity. A flagged
//! record always comes back together with its immediate predecessor in the
//! same partition, since the predecessor is the reference point needed to
//! interpret the burst.
//!
//! Both entry points expect rows from `views::with_downtime`; the per-user
//! variants expect `Partition::PerUser` ordering. A downtime of 0 marks a
//! partition's first record and is never a burst, so it is excluded
//! everywhere. Because of that exclusion, every flagged row has a
//! predecessor at the preceding index.

use std::collections::{BTreeMap, BTreeSet};

use crate::deviation::ensure_factor;
use crate::error::SurveilError;
use crate::stats::{self, Direction};
use crate::types::{DowntimeRow, Outcome, PairRow, Shortfall};

fn pair(row: &DowntimeRow) -> PairRow {
    PairRow {
        user_id: row.user_id.clone(),
        created_at: row.created_at,
        order_id: row.order_id.clone(),
        order_amount: row.order_amount,
        time_diff: row.time_diff,
    }
}

/// Deduplicate flagged indices plus their predecessors and emit rows
/// ordered by (user, timestamp).
fn collect_pairs(rows: &[DowntimeRow], flagged: impl IntoIterator<Item = usize>) -> Vec<PairRow> {
    let mut selected: BTreeSet<usize> = BTreeSet::new();
    for i in flagged {
        selected.insert(i);
        if i > 0 {
            selected.insert(i - 1);
        }
    }
    let mut out: Vec<PairRow> = selected.into_iter().map(|i| pair(&rows[i])).collect();
    out.sort_by(|a, b| (&a.user_id, a.created_at).cmp(&(&b.user_id, b.created_at)));
    out
}

/// Absolute-threshold mode: flag every record whose downtime is strictly
/// between 0 and `threshold_minutes`.
pub fn rapid_pairs(
    rows: &[DowntimeRow],
    threshold_minutes: f64,
) -> Result<Outcome<PairRow>, SurveilError> {
    if !threshold_minutes.is_finite() || threshold_minutes <= 0.0 {
        return Err(SurveilError::invalid(format!(
            "frequency threshold must be a positive number of minutes, got {threshold_minutes}"
        )));
    }
    if rows.is_empty() {
        return Ok(Outcome::Undetermined(Shortfall::EmptyPopulation));
    }
    let flagged = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.time_diff > 0.0 && r.time_diff < threshold_minutes)
        .map(|(i, _)| i);
    Ok(Outcome::from_rows(collect_pairs(rows, flagged)))
}

/// Statistical mode over the whole batch's downtime series: flag a record
/// whose downtime is more than k standard deviations below the mean of the
/// strictly positive downtimes.
pub fn downtime_outliers(rows: &[DowntimeRow], k: f64) -> Result<Outcome<PairRow>, SurveilError> {
    ensure_factor(k)?;
    let positives: Vec<f64> = rows
        .iter()
        .map(|r| r.time_diff)
        .filter(|&td| td > 0.0)
        .collect();
    let mean = match stats::mean(&positives) {
        Some(m) => m,
        None => return Ok(Outcome::Undetermined(Shortfall::EmptyPopulation)),
    };
    let std = match stats::sample_std(&positives) {
        Some(s) => s,
        None => return Ok(Outcome::Undetermined(Shortfall::DegenerateStddev)),
    };
    let dev = k * std;
    let flagged = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.time_diff > 0.0 && stats::outside(r.time_diff, mean, dev, Direction::Low))
        .map(|(i, _)| i);
    Ok(Outcome::from_rows(collect_pairs(rows, flagged)))
}

/// Statistical mode with each user evaluated against their own downtime
/// history. Users with fewer than two positive downtimes carry no sample
/// deviation and are skipped; the detector is undetermined only when no
/// user could be evaluated.
pub fn per_user_downtime_outliers(
    rows: &[DowntimeRow],
    k: f64,
) -> Result<Outcome<PairRow>, SurveilError> {
    ensure_factor(k)?;
    if rows.is_empty() {
        return Ok(Outcome::Undetermined(Shortfall::EmptyPopulation));
    }

    let mut by_user: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, r) in rows.iter().enumerate() {
        by_user.entry(r.user_id.as_str()).or_default().push(i);
    }

    let mut flagged: Vec<usize> = Vec::new();
    let mut any_evaluable = false;
    for indices in by_user.values() {
        let positives: Vec<f64> = indices
            .iter()
            .map(|&i| rows[i].time_diff)
            .filter(|&td| td > 0.0)
            .collect();
        let (mean, std) = match (stats::mean(&positives), stats::sample_std(&positives)) {
            (Some(m), Some(s)) => (m, s),
            _ => continue,
        };
        any_evaluable = true;
        let dev = k * std;
        flagged.extend(indices.iter().copied().filter(|&i| {
            rows[i].time_diff > 0.0 && stats::outside(rows[i].time_diff, mean, dev, Direction::Low)
        }));
    }
    if !any_evaluable {
        return Ok(Outcome::Undetermined(Shortfall::DegenerateStddev));
    }
    Ok(Outcome::from_rows(collect_pairs(rows, flagged)))
}
