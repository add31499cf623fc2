#![allow(dead_code)]

use chrono::NaiveDate;
use papertrader::domain::config::SimulationConfig;
use papertrader::domain::error::PaperTraderError;
use papertrader::domain::history::SimulationSummary;
use papertrader::domain::order::Order;
pub use papertrader::domain::price::PricePoint;
use papertrader::ports::analysis_port::AnalysisPort;
use papertrader::ports::price_port::PricePort;
use papertrader::ports::trade_store_port::TradeStorePort;
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub calls: Cell<usize>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: Cell::new(0),
        }
    }

    pub fn with_points(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_series(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, PaperTraderError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(PaperTraderError::UpstreamFetch {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// In-memory store. Lists orders newest first, like the SQLite adapter.
#[derive(Default)]
pub struct MemoryTradeStore {
    pub orders: RefCell<Vec<(String, SimulationConfig, Order)>>,
    pub simulations: RefCell<Vec<(String, SimulationSummary)>>,
    pub failing: Cell<bool>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.failing.set(true);
        store
    }

    fn check(&self) -> Result<(), PaperTraderError> {
        if self.failing.get() {
            return Err(PaperTraderError::Database {
                reason: "store offline".into(),
            });
        }
        Ok(())
    }
}

impl TradeStorePort for MemoryTradeStore {
    fn save_order(
        &self,
        user_id: &str,
        run: &SimulationConfig,
        order: &Order,
    ) -> Result<(), PaperTraderError> {
        self.check()?;
        self.orders
            .borrow_mut()
            .push((user_id.to_string(), run.clone(), order.clone()));
        Ok(())
    }

    fn load_orders(
        &self,
        user_id: &str,
        run: &SimulationConfig,
    ) -> Result<Vec<Order>, PaperTraderError> {
        self.check()?;
        Ok(self
            .orders
            .borrow()
            .iter()
            .rev()
            .filter(|(owner, saved_run, _)| owner == user_id && saved_run == run)
            .map(|(_, _, order)| order.clone())
            .collect())
    }

    fn save_simulation(
        &self,
        user_id: &str,
        summary: &SimulationSummary,
    ) -> Result<(), PaperTraderError> {
        self.check()?;
        self.simulations
            .borrow_mut()
            .push((user_id.to_string(), summary.clone()));
        Ok(())
    }

    fn list_simulations(&self) -> Result<Vec<(String, SimulationSummary)>, PaperTraderError> {
        self.check()?;
        Ok(self.simulations.borrow().clone())
    }
}

#[derive(Default)]
pub struct RecordingAnalyst {
    pub prompts: RefCell<Vec<String>>,
    pub failing: bool,
}

impl RecordingAnalyst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            prompts: RefCell::new(Vec::new()),
            failing: true,
        }
    }

    pub fn count(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl AnalysisPort for RecordingAnalyst {
    fn request_analysis(&self, prompt: &str) -> Result<(), PaperTraderError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        if self.failing {
            return Err(PaperTraderError::Analysis {
                reason: "model unavailable".into(),
            });
        }
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(date: NaiveDate, close: Decimal) -> PricePoint {
    PricePoint {
        date,
        open: close,
        high: close + Decimal::ONE,
        low: close - Decimal::ONE,
        close,
        adj_close: close,
        volume: 1000,
    }
}

/// One point per calendar day, close rising by `step` each day.
pub fn generate_points(start: NaiveDate, count: usize, start_price: Decimal, step: Decimal) -> Vec<PricePoint> {
    (0..count)
        .map(|i| {
            make_point(
                start + chrono::Duration::days(i as i64),
                start_price + step * Decimal::from(i as i64),
            )
        })
        .collect()
}
