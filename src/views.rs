//! Derived Metrics Builder: turns the immutable record batch into the
//! working views the detectors consume. Nothing here mutates the batch.

use crate::types::{DowntimeRow, OrderView, TransactionRecord};

/// How downtime is partitioned: one global timeline, or one timeline per
/// user. The partition key is the primary sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Global,
    PerUser,
}

/// Attach `order_amount` and calendar `date` to every record. Pure and
/// total; preserves the input order.
pub fn augment(batch: &[TransactionRecord]) -> Vec<OrderView> {
    batch
        .iter()
        .map(|r| OrderView {
            user_id: r.user_id.clone(),
            created_at: r.created_at,
            date: r.created_at.date(),
            order_type: r.order_type,
            order_id: r.order_id.clone(),
            isin: r.isin.clone(),
            order_amount: r.quantity * r.unit_price,
        })
        .collect()
}

/// Attach downtime to every record under the chosen partitioning.
///
/// Ordering is `created_at` ascending (partition key first for `PerUser`),
/// with ties broken by original input order: `sort_by` is stable, so
/// repeated runs over the same input assign identical downtimes. The first
/// record of each partition gets 0, and any negative difference clamps to 0.
pub fn with_downtime(batch: &[TransactionRecord], partition: Partition) -> Vec<DowntimeRow> {
    let mut ordered: Vec<&TransactionRecord> = batch.iter().collect();
    match partition {
        Partition::Global => ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        Partition::PerUser => {
            ordered.sort_by(|a, b| (&a.user_id, a.created_at).cmp(&(&b.user_id, b.created_at)))
        }
    }

    let mut rows = Vec::with_capacity(ordered.len());
    for (i, rec) in ordered.iter().enumerate() {
        let prev = if i == 0 {
            None
        } else {
            let p = ordered[i - 1];
            match partition {
                Partition::Global => Some(p),
                Partition::PerUser if p.user_id == rec.user_id => Some(p),
                Partition::PerUser => None,
            }
        };
        let time_diff = match prev {
            Some(p) => minutes_between(p, rec).max(0.0),
            None => 0.0,
        };
        rows.push(DowntimeRow {
            user_id: rec.user_id.clone(),
            created_at: rec.created_at,
            order_id: rec.order_id.clone(),
            order_amount: rec.quantity * rec.unit_price,
            time_diff,
        });
    }
    rows
}

fn minutes_between(prev: &TransactionRecord, cur: &TransactionRecord) -> f64 {
    (cur.created_at - prev.created_at).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;
    use chrono::NaiveDate;

    fn rec(user: &str, minute: u32, order_id: &str) -> TransactionRecord {
        TransactionRecord {
            user_id: user.to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
                + chrono::Duration::minutes(minute as i64),
            order_type: OrderSide::Buy,
            order_id: order_id.to_string(),
            isin: "LU0000000001".to_string(),
            quantity: 10.0,
            unit_price: 5.0,
        }
    }

    #[test]
    fn augment_computes_amount_and_date() {
        let views = augment(&[rec("u1", 0, "o1")]);
        assert_eq!(views[0].order_amount, 50.0);
        assert_eq!(views[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn per_user_partition_resets_at_user_boundary() {
        let batch = vec![rec("u1", 0, "a"), rec("u2", 1, "b"), rec("u1", 10, "c")];
        let rows = with_downtime(&batch, Partition::PerUser);
        // Sorted u1(0), u1(10), u2(1); u2's only record starts its partition.
        assert_eq!(rows[0].time_diff, 0.0);
        assert_eq!(rows[1].time_diff, 10.0);
        assert_eq!(rows[2].user_id, "u2");
        assert_eq!(rows[2].time_diff, 0.0);
    }

    #[test]
    fn equal_timestamps_keep_input_order_and_zero_diff() {
        let batch = vec![rec("u1", 5, "first"), rec("u1", 5, "second")];
        let rows = with_downtime(&batch, Partition::PerUser);
        assert_eq!(rows[0].order_id, "first");
        assert_eq!(rows[1].order_id, "second");
        assert_eq!(rows[1].time_diff, 0.0);
    }

    #[test]
    fn global_partition_spans_users() {
        let batch = vec![rec("u1", 0, "a"), rec("u2", 3, "b")];
        let rows = with_downtime(&batch, Partition::Global);
        assert_eq!(rows[1].user_id, "u2");
        assert_eq!(rows[1].time_diff, 3.0);
    }
}
