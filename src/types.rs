use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

// ── Input Types (loaded from the CSV boundary) ──

/// Order direction. Exactly two legal values in the input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One raw trade order record. Immutable once loaded; detectors derive
/// their own views and never mutate the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: NaiveDateTime,
    pub order_type: OrderSide,
    pub order_id: String,
    pub isin: String,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Accepts `2024-01-05 10:30:00`, `2024-01-05T10:30:00` and optional
/// fractional seconds.
fn deserialize_timestamp<'de, D>(d: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Ok(ts);
        }
    }
    Err(serde::de::Error::custom(format!("unparseable timestamp: {s}")))
}

// ── Derived Views ──

/// Record with derived `order_amount` and calendar `date` attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub date: NaiveDate,
    pub order_type: OrderSide,
    pub order_id: String,
    pub isin: String,
    pub order_amount: f64,
}

/// Record with downtime attached: fractional minutes since the previous
/// record in the chosen ordering. 0 marks the first record of a partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DowntimeRow {
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub order_id: String,
    pub order_amount: f64,
    pub time_diff: f64,
}

// ── Result Rows (consumed by the report layer) ──

/// A record flagged on its order value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountFlag {
    pub created_at: NaiveDateTime,
    pub user_id: String,
    pub order_id: String,
    pub order_amount: f64,
}

/// A record in a rapid-activity pair: either flagged on its downtime or
/// the immediate predecessor needed to interpret the burst.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairRow {
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub order_id: String,
    pub order_amount: f64,
    pub time_diff: f64,
}

/// Per-side summed amount for a flagged (user, isin, date) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircularRow {
    pub user_id: String,
    pub isin: String,
    pub date: NaiveDate,
    pub order_type: OrderSide,
    pub total_amount: f64,
}

/// One point of a sensitivity sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub factor: f64,
    pub pct_flagged: f64,
}

// ── Detector Outcome ──

/// Why a statistic could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Shortfall {
    /// Zero records in the evaluated population.
    EmptyPopulation,
    /// One record: sample standard deviation is undefined.
    DegenerateStddev,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortfall::EmptyPopulation => write!(f, "empty population"),
            Shortfall::DegenerateStddev => write!(f, "population too small for a deviation"),
        }
    }
}

/// Tagged detector result. `Clear` means the population was evaluated and
/// nothing was flagged; `Undetermined` means the statistic could not be
/// computed at all. Callers can always tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome<T> {
    Flagged(Vec<T>),
    Clear,
    Undetermined(Shortfall),
}

impl<T> Outcome<T> {
    /// Wraps a flag set, mapping an empty set to `Clear`.
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Outcome::Clear
        } else {
            Outcome::Flagged(rows)
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, Outcome::Flagged(_))
    }

    /// Flagged rows, empty for `Clear` and `Undetermined`.
    pub fn rows(&self) -> &[T] {
        match self {
            Outcome::Flagged(rows) => rows,
            _ => &[],
        }
    }
}
