//! Plain grouped sums for the report layer. No statistical decisions here.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{OrderSide, OrderView};

/// Turnover and signed balance for one entity (user or instrument).
#[derive(Debug, Clone, Serialize)]
pub struct EntityTotals {
    pub entity: String,
    pub buy_total: f64,
    pub sell_total: f64,
    /// buy_total + sell_total.
    pub turnover: f64,
    /// buy_total − sell_total.
    pub balance: f64,
}

/// Record count and turnover for one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub orders: usize,
    pub turnover: f64,
}

fn totals_by<'a>(
    views: &'a [OrderView],
    key: impl Fn(&'a OrderView) -> &'a str,
) -> Vec<EntityTotals> {
    let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for v in views {
        let entry = sums.entry(key(v)).or_insert((0.0, 0.0));
        match v.order_type {
            OrderSide::Buy => entry.0 += v.order_amount,
            OrderSide::Sell => entry.1 += v.order_amount,
        }
    }
    sums.into_iter()
        .map(|(entity, (buy_total, sell_total))| EntityTotals {
            entity: entity.to_string(),
            buy_total,
            sell_total,
            turnover: buy_total + sell_total,
            balance: buy_total - sell_total,
        })
        .collect()
}

/// Per-user turnover and balance, users ascending.
pub fn totals_by_user(views: &[OrderView]) -> Vec<EntityTotals> {
    totals_by(views, |v| v.user_id.as_str())
}

/// Per-instrument turnover and balance, isins ascending.
pub fn totals_by_instrument(views: &[OrderView]) -> Vec<EntityTotals> {
    totals_by(views, |v| v.isin.as_str())
}

/// Per-day record counts and turnover, dates ascending.
pub fn totals_by_day(views: &[OrderView]) -> Vec<DailyTotals> {
    let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for v in views {
        let entry = days.entry(v.date).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += v.order_amount;
    }
    days.into_iter()
        .map(|(date, (orders, turnover))| DailyTotals { date, orders, turnover })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionRecord;
    use crate::views::augment;
    use chrono::NaiveDate;

    fn rec(user: &str, isin: &str, day: u32, side: OrderSide, amount: f64) -> TransactionRecord {
        TransactionRecord {
            user_id: user.to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            order_type: side,
            order_id: format!("{user}-{day}"),
            isin: isin.to_string(),
            quantity: amount,
            unit_price: 1.0,
        }
    }

    #[test]
    fn user_totals_split_buy_and_sell() {
        let batch = vec![
            rec("u1", "LU1", 1, OrderSide::Buy, 300.0),
            rec("u1", "LU2", 2, OrderSide::Sell, 100.0),
            rec("u2", "LU1", 1, OrderSide::Buy, 50.0),
        ];
        let totals = totals_by_user(&augment(&batch));
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].entity, "u1");
        assert_eq!(totals[0].turnover, 400.0);
        assert_eq!(totals[0].balance, 200.0);
        assert_eq!(totals[1].entity, "u2");
        assert_eq!(totals[1].balance, 50.0);
    }

    #[test]
    fn daily_totals_count_and_sum() {
        let batch = vec![
            rec("u1", "LU1", 1, OrderSide::Buy, 300.0),
            rec("u2", "LU1", 1, OrderSide::Sell, 100.0),
            rec("u1", "LU1", 3, OrderSide::Buy, 10.0),
        ];
        let days = totals_by_day(&augment(&batch));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].orders, 2);
        assert_eq!(days[0].turnover, 400.0);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }
}
