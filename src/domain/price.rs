//! Daily price point and the strict row schema used at the provider boundary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adj_close: Decimal,
    pub volume: u64,
}

impl PricePoint {
    /// Rejects rows with non-positive prices or an inverted high/low range.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adj_close", self.adj_close),
        ];
        for (name, value) in fields {
            if value <= Decimal::ZERO {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }
        if self.high < self.low {
            return Err(format!(
                "high {} is below low {} on {}",
                self.high, self.low, self.date
            ));
        }
        Ok(())
    }
}

/// One row as delivered by a price provider. Every field is required and
/// typed; nothing is coerced.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRow {
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    #[serde(alias = "Open", with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(alias = "High", with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(alias = "Low", with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(alias = "Close", with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(
        alias = "adjClose",
        alias = "Adj Close",
        with = "rust_decimal::serde::str"
    )]
    pub adj_close: Decimal,
    #[serde(alias = "Volume")]
    pub volume: u64,
}

impl TryFrom<PriceRow> for PricePoint {
    type Error = String;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        let point = PricePoint {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
            volume: row.volume,
        };
        point.validate()?;
        Ok(point)
    }
}
