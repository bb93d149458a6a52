//! Circular Trading Detector: the same user trading both directions on the
//! same instrument within the same calendar day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{CircularRow, Outcome, OrderSide, OrderView, Shortfall};

/// Partition the batch by (user, isin, date) and flag every partition that
/// contains more than one distinct order direction. Each flagged partition
/// yields one row per direction present, carrying the direction's summed
/// order value. Rows come out ordered by user, isin, date, direction.
pub fn circular_trades(views: &[OrderView]) -> Outcome<CircularRow> {
    if views.is_empty() {
        return Outcome::Undetermined(Shortfall::EmptyPopulation);
    }

    // (user, isin, date) -> side -> summed amount. BTreeMap keys give the
    // required output ordering for free.
    let mut groups: BTreeMap<(&str, &str, NaiveDate), BTreeMap<OrderSide, f64>> = BTreeMap::new();
    for v in views {
        *groups
            .entry((v.user_id.as_str(), v.isin.as_str(), v.date))
            .or_default()
            .entry(v.order_type)
            .or_insert(0.0) += v.order_amount;
    }

    let mut rows = Vec::new();
    for ((user_id, isin, date), sides) in &groups {
        if sides.len() <= 1 {
            continue;
        }
        for (side, total) in sides {
            rows.push(CircularRow {
                user_id: user_id.to_string(),
                isin: isin.to_string(),
                date: *date,
                order_type: *side,
                total_amount: *total,
            });
        }
    }
    Outcome::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionRecord;
    use crate::views::augment;
    use chrono::NaiveDate;

    fn rec(user: &str, isin: &str, day: u32, hour: u32, side: OrderSide, amount: f64) -> TransactionRecord {
        TransactionRecord {
            user_id: user.to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            order_type: side,
            order_id: format!("{user}-{isin}-{day}-{hour}"),
            isin: isin.to_string(),
            quantity: amount,
            unit_price: 1.0,
        }
    }

    #[test]
    fn single_direction_group_is_clear() {
        let batch = vec![
            rec("u1", "LU1", 1, 9, OrderSide::Buy, 100.0),
            rec("u1", "LU1", 1, 10, OrderSide::Buy, 50.0),
        ];
        assert_eq!(circular_trades(&augment(&batch)), Outcome::Clear);
    }

    #[test]
    fn both_directions_same_day_yield_two_summed_rows() {
        let batch = vec![
            rec("u1", "LU1", 1, 9, OrderSide::Buy, 100.0),
            rec("u1", "LU1", 1, 15, OrderSide::Sell, 40.0),
        ];
        let outcome = circular_trades(&augment(&batch));
        let rows = outcome.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order_type, OrderSide::Buy);
        assert_eq!(rows[0].total_amount, 100.0);
        assert_eq!(rows[1].order_type, OrderSide::Sell);
        assert_eq!(rows[1].total_amount, 40.0);
    }

    #[test]
    fn opposite_directions_on_different_days_are_not_circular() {
        let batch = vec![
            rec("u1", "LU1", 1, 9, OrderSide::Buy, 100.0),
            rec("u1", "LU1", 2, 9, OrderSide::Sell, 100.0),
        ];
        assert_eq!(circular_trades(&augment(&batch)), Outcome::Clear);
    }

    #[test]
    fn empty_batch_is_undetermined_not_clear() {
        assert_eq!(
            circular_trades(&[]),
            Outcome::Undetermined(Shortfall::EmptyPopulation)
        );
    }
}
