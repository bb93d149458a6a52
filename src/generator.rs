//! Synthetic batch generator for demo runs and benches. Produces mostly
//! unremarkable order flow and, at a configurable rate, injects the
//! scenarios the detectors exist for: oversized tickets, rapid bursts and
//! same-day round trips.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{OrderSide, TransactionRecord};

pub const INSTRUMENTS: &[(&str, f64)] = &[
    ("LU0000000101", 42.0),
    ("LU0000000102", 118.5),
    ("LU0000000103", 9.8),
    ("LU0000000104", 250.0),
    ("LU0000000105", 77.3),
];

const NORMAL_USERS: &[&str] = &[
    "user|a1", "user|a2", "user|a3", "user|a4", "user|a5", "user|a6",
];
const SUSPECT_USERS: &[&str] = &["user|x1", "user|x2"];

#[derive(Debug, Clone, Copy)]
enum Scenario {
    BigTicket,
    Burst,
    RoundTrip,
}

const ALL_SCENARIOS: &[Scenario] = &[Scenario::BigTicket, Scenario::Burst, Scenario::RoundTrip];

pub struct BatchGenerator {
    rng: StdRng,
    prices: HashMap<String, f64>,
    order_seq: u64,
    clock: NaiveDateTime,
    pub fraud_rate: f64,
}

impl BatchGenerator {
    /// Seeded so the same (seed, fraud_rate, count) always yields the same
    /// batch; demo output and benches stay reproducible.
    pub fn new(fraud_rate: f64, seed: u64) -> Self {
        let mut prices = HashMap::new();
        for (isin, base) in INSTRUMENTS {
            prices.insert(isin.to_string(), *base);
        }
        Self {
            rng: StdRng::seed_from_u64(seed),
            prices,
            order_seq: 0,
            clock: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            fraud_rate,
        }
    }

    /// Generate at least `count` records in timestamp order.
    pub fn generate(&mut self, count: usize) -> Vec<TransactionRecord> {
        let mut batch = Vec::with_capacity(count + 16);
        while batch.len() < count {
            if self.rng.gen_bool(self.fraud_rate.clamp(0.0, 1.0)) {
                let scenario = ALL_SCENARIOS[self.rng.gen_range(0..ALL_SCENARIOS.len())];
                match scenario {
                    Scenario::BigTicket => batch.push(self.big_ticket()),
                    Scenario::Burst => batch.extend(self.burst()),
                    Scenario::RoundTrip => batch.extend(self.round_trip()),
                }
            } else {
                batch.push(self.normal());
            }
        }
        batch
    }

    fn advance_clock(&mut self) {
        let minutes = self.rng.gen_range(20..360);
        self.clock += Duration::minutes(minutes);
    }

    fn next_order_id(&mut self) -> String {
        self.order_seq += 1;
        format!("ord|{:06}", self.order_seq)
    }

    fn pick_instrument(&mut self) -> (String, f64) {
        let (isin, _) = INSTRUMENTS[self.rng.gen_range(0..INSTRUMENTS.len())];
        let price = self.prices.get_mut(isin).unwrap();
        let drift = *price * self.rng.gen_range(-0.005..0.005);
        *price += drift;
        (isin.to_string(), *price)
    }

    fn record(
        &mut self,
        user: &str,
        created_at: NaiveDateTime,
        side: OrderSide,
        isin: String,
        quantity: f64,
        unit_price: f64,
    ) -> TransactionRecord {
        TransactionRecord {
            user_id: user.to_string(),
            created_at,
            order_type: side,
            order_id: self.next_order_id(),
            isin,
            quantity,
            unit_price,
        }
    }

    fn normal(&mut self) -> TransactionRecord {
        self.advance_clock();
        let user = NORMAL_USERS[self.rng.gen_range(0..NORMAL_USERS.len())];
        let side = if self.rng.gen_bool(0.5) { OrderSide::Buy } else { OrderSide::Sell };
        let (isin, price) = self.pick_instrument();
        let quantity = self.rng.gen_range(1..50) as f64;
        let at = self.clock;
        self.record(user, at, side, isin, quantity, price)
    }

    /// A single order 20-60x the usual size.
    fn big_ticket(&mut self) -> TransactionRecord {
        self.advance_clock();
        let user = SUSPECT_USERS[self.rng.gen_range(0..SUSPECT_USERS.len())];
        let (isin, price) = self.pick_instrument();
        let quantity = (self.rng.gen_range(1..50) * self.rng.gen_range(20..60)) as f64;
        let at = self.clock;
        self.record(user, at, OrderSide::Buy, isin, quantity, price)
    }

    /// 4-8 orders from one user, seconds to a couple of minutes apart.
    fn burst(&mut self) -> Vec<TransactionRecord> {
        self.advance_clock();
        let user = SUSPECT_USERS[self.rng.gen_range(0..SUSPECT_USERS.len())];
        let (isin, price) = self.pick_instrument();
        let count = self.rng.gen_range(4..=8);
        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            self.clock += Duration::seconds(self.rng.gen_range(20..120));
            let side = if self.rng.gen_bool(0.5) { OrderSide::Buy } else { OrderSide::Sell };
            let quantity = self.rng.gen_range(1..30) as f64;
            let at = self.clock;
            records.push(self.record(user, at, side, isin.clone(), quantity, price));
        }
        records
    }

    /// Buy and sell of the same instrument by the same user within hours.
    fn round_trip(&mut self) -> Vec<TransactionRecord> {
        self.advance_clock();
        let user = SUSPECT_USERS[self.rng.gen_range(0..SUSPECT_USERS.len())];
        let (isin, price) = self.pick_instrument();
        let quantity = self.rng.gen_range(5..80) as f64;
        let buy_at = self.clock;
        let buy = self.record(user, buy_at, OrderSide::Buy, isin.clone(), quantity, price);
        self.clock += Duration::hours(self.rng.gen_range(1..4));
        let sell_at = self.clock;
        let sell = self.record(user, sell_at, OrderSide::Sell, isin, quantity, price);
        vec![buy, sell]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_batch() {
        let a = BatchGenerator::new(0.1, 7).generate(200);
        let b = BatchGenerator::new(0.1, 7).generate(200);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.order_id, y.order_id);
            assert_eq!(x.created_at, y.created_at);
            assert_eq!(x.quantity, y.quantity);
        }
    }

    #[test]
    fn timestamps_are_monotonic() {
        let batch = BatchGenerator::new(0.2, 3).generate(500);
        for pair in batch.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }
}
