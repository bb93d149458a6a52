//! Text and JSON rendering of detector outcomes and aggregate tables.
//! Presentation only; every decision was made upstream.

use serde::Serialize;

use crate::aggregates::{DailyTotals, EntityTotals};
use crate::stats::Band;
use crate::types::{AmountFlag, CircularRow, Outcome, PairRow, SweepPoint};

/// A result row the text renderer knows how to lay out.
pub trait Row {
    fn header() -> &'static str;
    fn line(&self) -> String;
}

impl Row for AmountFlag {
    fn header() -> &'static str {
        "created_at           user          order       order_amount"
    }
    fn line(&self) -> String {
        format!(
            "{}  {:<12}  {:<10}  {:>12.2}",
            self.created_at, self.user_id, self.order_id, self.order_amount
        )
    }
}

impl Row for PairRow {
    fn header() -> &'static str {
        "user          created_at           order       order_amount  downtime_min"
    }
    fn line(&self) -> String {
        format!(
            "{:<12}  {}  {:<10}  {:>12.2}  {:>12.2}",
            self.user_id, self.created_at, self.order_id, self.order_amount, self.time_diff
        )
    }
}

impl Row for CircularRow {
    fn header() -> &'static str {
        "user          isin          date        side  total_amount"
    }
    fn line(&self) -> String {
        format!(
            "{:<12}  {:<12}  {}  {:<4}  {:>12.2}",
            self.user_id, self.isin, self.date, self.order_type, self.total_amount
        )
    }
}

pub fn print_outcome<T: Row + Serialize>(title: &str, outcome: &Outcome<T>, json: bool) {
    println!();
    println!("=== {title} ===");
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(body) => println!("{body}"),
            Err(e) => log::error!("failed to serialize {title}: {e}"),
        }
        return;
    }
    match outcome {
        Outcome::Undetermined(shortfall) => println!("  not evaluated: {shortfall}"),
        Outcome::Clear => println!("  no suspicious activity"),
        Outcome::Flagged(rows) => {
            println!("  {} suspicious record(s)", rows.len());
            println!("  {}", T::header());
            for row in rows {
                println!("  {}", row.line());
            }
        }
    }
}

pub fn print_entity_totals(title: &str, totals: &[EntityTotals]) {
    println!();
    println!("=== {title} ===");
    println!("  entity                          turnover       balance");
    for t in totals {
        println!("  {:<28}  {:>12.2}  {:>12.2}", t.entity, t.turnover, t.balance);
    }
}

pub fn print_daily_totals(days: &[DailyTotals]) {
    println!();
    println!("=== Orders per day ===");
    println!("  date        orders      turnover");
    for d in days {
        println!("  {}  {:>6}  {:>12.2}", d.date, d.orders, d.turnover);
    }
}

pub fn print_band(title: &str, band: Option<Band>) {
    println!();
    println!("=== {title} ===");
    match band {
        Some(b) => println!(
            "  mean {:.2}, acceptance band [{:.2}, {:.2}]",
            b.mean, b.lower, b.upper
        ),
        None => println!("  not evaluated: population too small for a deviation"),
    }
}

/// Condensed sweep table: ten evenly spaced factors plus the endpoints are
/// enough to pick a working k without a chart.
pub fn print_sweep(title: &str, points: &[SweepPoint], json: bool) {
    println!();
    println!("=== {title} ===");
    if json {
        match serde_json::to_string_pretty(points) {
            Ok(body) => println!("{body}"),
            Err(e) => log::error!("failed to serialize {title}: {e}"),
        }
        return;
    }
    if points.is_empty() {
        println!("  empty sweep");
        return;
    }
    println!("  factor    flagged_pct");
    let stride = (points.len() / 10).max(1);
    for p in points.iter().step_by(stride) {
        println!("  {:<8.3}  {:>10.2}%", p.factor, p.pct_flagged);
    }
    if (points.len() - 1) % stride != 0 {
        let last = &points[points.len() - 1];
        println!("  {:<8.3}  {:>10.2}%", last.factor, last.pct_flagged);
    }
}
