//! Portfolio value history.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::config::SimulationConfig;
use super::ledger::TradeLedger;
use super::position::reconstruct;
use super::price_cache::PriceSeriesCache;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
}

/// Portfolio value on every cached trading day from the simulation start
/// through `current_date`.
///
/// Each point is `leftover_cash + shares * close` for the cached ticker,
/// reconstructed from scratch for that day. With no prices in range the
/// series is flat at the starting capital: one point at the start date,
/// plus one at `current_date` once the clock has moved.
pub fn build(
    ledger: &TradeLedger,
    cache: &PriceSeriesCache,
    config: &SimulationConfig,
    current_date: NaiveDate,
) -> Vec<HistoryPoint> {
    let capital = config.starting_capital;
    let start = config.start_date;

    let history: Vec<HistoryPoint> = match cache.ticker() {
        Some(ticker) => cache
            .points_between(start, current_date)
            .iter()
            .map(|point| {
                let snapshot = reconstruct(ledger, ticker, point.date, capital);
                HistoryPoint {
                    date: point.date,
                    value: snapshot.total_value(point.close),
                }
            })
            .collect(),
        None => Vec::new(),
    };

    if !history.is_empty() {
        return history;
    }

    let mut flat = vec![HistoryPoint {
        date: start,
        value: capital,
    }];
    if start < current_date {
        flat.push(HistoryPoint {
            date: current_date,
            value: capital,
        });
    }
    flat
}

/// A finished simulation as stored for later comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub initial_investment: Decimal,
    pub final_value: Decimal,
    pub value_over_time: Vec<HistoryPoint>,
}

impl SimulationSummary {
    pub fn from_history(config: &SimulationConfig, history: Vec<HistoryPoint>) -> Self {
        let final_value = history
            .last()
            .map(|p| p.value)
            .unwrap_or(config.starting_capital);
        SimulationSummary {
            initial_investment: config.starting_capital,
            final_value,
            value_over_time: history,
        }
    }

    /// (final - initial) / initial * 100
    pub fn percent_gain(&self) -> Decimal {
        if self.initial_investment.is_zero() {
            return Decimal::ZERO;
        }
        (self.final_value - self.initial_investment) / self.initial_investment
            * Decimal::ONE_HUNDRED
    }
}
