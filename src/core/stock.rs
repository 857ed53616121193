//! Stock records and the per-run aggregation derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::StockflowError;

/// One stock quote row read from object storage. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Trading date.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price of the day.
    pub high: f64,
    /// Lowest price of the day.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume.
    pub volume: u64,
}

impl Stock {
    /// Parses a raw record row in the order
    /// `date, open, high, low, close, volume`.
    pub fn from_record(record: &[String]) -> Result<Self, StockflowError> {
        if record.len() != 6 {
            return Err(StockflowError::malformed(format!(
                "expected 6 fields, got {}",
                record.len()
            )));
        }

        let date = record[0]
            .parse::<NaiveDate>()
            .map_err(|e| StockflowError::malformed(format!("date '{}': {e}", record[0])))?;

        Ok(Self {
            date,
            open: parse_price(&record[1], "open")?,
            high: parse_price(&record[2], "high")?,
            low: parse_price(&record[3], "low")?,
            close: parse_price(&record[4], "close")?,
            volume: record[5]
                .parse::<u64>()
                .map_err(|e| StockflowError::malformed(format!("volume '{}': {e}", record[5])))?,
        })
    }
}

fn parse_price(raw: &str, field: &str) -> Result<f64, StockflowError> {
    raw.parse::<f64>()
        .map_err(|e| StockflowError::malformed(format!("{field} '{raw}': {e}")))
}

/// The single derived output of a run: the date and value of the greatest
/// `high` observed. Produced fresh each run, never persisted in-process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Trading date of the winning record.
    pub date: NaiveDate,
    /// The greatest high.
    pub high: f64,
}

impl Aggregation {
    /// Derives the aggregation from a single stock record.
    #[must_use]
    pub fn of(stock: &Stock) -> Self {
        Self {
            date: stock.date,
            high: stock.high,
        }
    }
}
