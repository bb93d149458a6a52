//! CSV ingestion boundary. The only place schema validation happens: the
//! detectors downstream assume a well-formed batch and never re-validate.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::SurveilError;
use crate::types::TransactionRecord;

/// The input column set, matched exactly; column order is irrelevant.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "user_id",
    "created_at",
    "order_type",
    "order_id",
    "isin",
    "quantity",
    "unit_price",
];

pub fn load_csv(path: &Path) -> Result<Vec<TransactionRecord>, SurveilError> {
    let file = std::fs::File::open(path)?;
    let batch = load_from_reader(file)?;
    log::info!("loaded {} records from {}", batch.len(), path.display());
    Ok(batch)
}

pub fn load_from_reader<R: io::Read>(reader: R) -> Result<Vec<TransactionRecord>, SurveilError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    verify_schema(csv_reader.headers()?)?;
    let mut batch = Vec::new();
    for result in csv_reader.deserialize() {
        let record: TransactionRecord = result?;
        batch.push(record);
    }
    Ok(batch)
}

fn verify_schema(headers: &csv::StringRecord) -> Result<(), SurveilError> {
    let expected: BTreeSet<&str> = REQUIRED_COLUMNS.iter().copied().collect();
    let found: BTreeSet<&str> = headers.iter().collect();
    if expected == found {
        return Ok(());
    }
    let missing = expected
        .difference(&found)
        .map(|c| c.to_string())
        .collect();
    let unexpected = found
        .difference(&expected)
        .map(|c| c.to_string())
        .collect();
    Err(SurveilError::SchemaMismatch { missing, unexpected })
}

/// Records stamped after `now`. Such records are reported, never rejected:
/// the batch stays intact and the caller decides what to surface.
pub fn future_dated(batch: &[TransactionRecord], now: NaiveDateTime) -> Vec<&TransactionRecord> {
    batch.iter().filter(|r| r.created_at > now).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderSide;

    const HEADER: &str = "user_id,created_at,order_type,order_id,isin,quantity,unit_price";

    #[test]
    fn loads_well_formed_rows() {
        let data = format!(
            "{HEADER}\nu1,2024-03-01 09:00:00,BUY,o1,LU0000000001,10,5.5\n\
             u2,2024-03-01T10:30:00,SELL,o2,LU0000000002,2,100\n"
        );
        let batch = load_from_reader(data.as_bytes()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].order_type, OrderSide::Buy);
        assert_eq!(batch[1].quantity, 2.0);
    }

    #[test]
    fn accepts_reordered_columns() {
        let data = "unit_price,user_id,quantity,isin,order_id,order_type,created_at\n\
                    5.5,u1,10,LU0000000001,o1,BUY,2024-03-01 09:00:00\n";
        let batch = load_from_reader(data.as_bytes()).unwrap();
        assert_eq!(batch[0].unit_price, 5.5);
    }

    #[test]
    fn missing_and_extra_columns_are_named() {
        let data = "user_id,created_at,order_type,order_id,isin,quantity,comment\nx\n";
        match load_from_reader(data.as_bytes()) {
            Err(SurveilError::SchemaMismatch { missing, unexpected }) => {
                assert_eq!(missing, vec!["unit_price".to_string()]);
                assert_eq!(unexpected, vec!["comment".to_string()]);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn future_dated_records_are_reported_not_dropped() {
        let data = format!(
            "{HEADER}\nu1,2024-03-01 09:00:00,BUY,o1,LU0000000001,10,5.5\n\
             u1,2099-01-01 00:00:00,BUY,o2,LU0000000001,1,1\n"
        );
        let batch = load_from_reader(data.as_bytes()).unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let future = future_dated(&batch, now);
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].order_id, "o2");
        assert_eq!(batch.len(), 2);
    }
}
