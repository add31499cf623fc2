//! Historical price provider port.

use crate::domain::error::PaperTraderError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait PricePort {
    /// Daily points for `ticker` with `start_date <= date <= end_date`,
    /// ascending. An instrument with no observations in range yields an
    /// empty vector, not an error.
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PaperTraderError>;
}
