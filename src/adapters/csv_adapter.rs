//! CSV file price adapter.
//!
//! Reads `<base>/<TICKER>.csv` with a `date,open,high,low,close,adj_close,volume`
//! header (Yahoo-style capitalised headers are accepted too).

use crate::domain::error::PaperTraderError;
use crate::domain::price::{PricePoint, PriceRow};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker.to_uppercase()))
    }

}

/// Parse every row of a price CSV. The first malformed row fails the
/// whole read.
pub fn read_price_rows<R: Read>(reader: R) -> Result<Vec<PricePoint>, PaperTraderError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();

    for (i, result) in rdr.deserialize::<PriceRow>().enumerate() {
        let row = i + 1;
        let raw = result.map_err(|e| PaperTraderError::MalformedPriceRow {
            row,
            reason: e.to_string(),
        })?;
        let point = PricePoint::try_from(raw)
            .map_err(|reason| PaperTraderError::MalformedPriceRow { row, reason })?;
        points.push(point);
    }

    Ok(points)
}

pub fn read_price_file(path: &Path) -> Result<Vec<PricePoint>, PaperTraderError> {
    let file = File::open(path)?;
    read_price_rows(file)
}

impl PricePort for CsvPriceAdapter {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PaperTraderError> {
        let path = self.csv_path(ticker);
        let file = File::open(&path).map_err(|e| PaperTraderError::UpstreamFetch {
            ticker: ticker.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut points: Vec<PricePoint> = read_price_rows(file)?
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect();
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
