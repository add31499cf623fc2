//! A single user's simulation run.
//!
//! `Simulation` owns the configuration, clock, ledger and price cache for
//! one run and is the only place they are mutated. Derived views
//! (position, history, metrics) are recomputed on every read.

use chrono::NaiveDate;

use super::analysis::{AnalysisTracker, analysis_prompt};
use super::clock::SimulationClock;
use super::config::{SimulationConfig, SimulationPolicies};
use super::error::{ClockError, PaperTraderError};
use super::history::{self, HistoryPoint, SimulationSummary};
use super::ledger::TradeLedger;
use super::metrics::Metrics;
use super::order::{Order, ProposedOrder, Side};
use super::position::{PositionSnapshot, reconstruct};
use super::price_cache::PriceSeriesCache;
use super::validator;
use crate::ports::analysis_port::AnalysisPort;
use crate::ports::price_port::PricePort;
use crate::ports::trade_store_port::TradeStorePort;

#[derive(Debug, Clone)]
pub struct Simulation {
    user_id: String,
    ticker: String,
    config: SimulationConfig,
    policies: SimulationPolicies,
    clock: SimulationClock,
    ledger: TradeLedger,
    cache: PriceSeriesCache,
    analysis: AnalysisTracker,
}

impl Simulation {
    /// Validate `config`, start the clock at its start date and load prices
    /// for the opening window.
    pub fn start(
        user_id: &str,
        ticker: &str,
        config: SimulationConfig,
        policies: SimulationPolicies,
        today: NaiveDate,
        prices: &dyn PricePort,
    ) -> Result<Self, PaperTraderError> {
        let ticker = normalize_ticker(ticker)?;
        let mut clock = SimulationClock::new();
        clock.start(&config, today, policies.end_date)?;

        let mut simulation = Simulation {
            user_id: user_id.to_string(),
            ticker,
            config,
            policies,
            clock,
            ledger: TradeLedger::new(),
            cache: PriceSeriesCache::new(),
            analysis: AnalysisTracker::new(policies.analysis_dedup),
        };
        simulation.refresh_prices(prices)?;
        tracing::info!(
            user = %simulation.user_id,
            ticker = %simulation.ticker,
            start = %simulation.config.start_date,
            months = simulation.config.duration_months,
            capital = %simulation.config.starting_capital,
            "simulation started"
        );
        Ok(simulation)
    }

    /// Replace the configuration. This is a full restart: the ledger is
    /// emptied and the clock returns to the new start date. An invalid
    /// configuration leaves the running simulation untouched.
    pub fn reconfigure(
        &mut self,
        config: SimulationConfig,
        today: NaiveDate,
        prices: &dyn PricePort,
    ) -> Result<(), PaperTraderError> {
        let mut clock = SimulationClock::new();
        clock.start(&config, today, self.policies.end_date)?;

        self.config = config;
        self.clock = clock;
        self.ledger = TradeLedger::new();
        self.analysis.reset();
        tracing::info!(user = %self.user_id, "simulation reset by configuration change");
        self.refresh_prices(prices)
    }

    /// Seed the ledger from persisted orders and move the clock up to the
    /// newest of them. Meant for session start, before any order is placed.
    ///
    /// No order placed afterwards can be dated before a restored one. Orders
    /// dated outside the run window are refused.
    pub fn restore(
        &mut self,
        orders: Vec<Order>,
        prices: &dyn PricePort,
    ) -> Result<(), PaperTraderError> {
        let start = self.clock.start_date()?;
        let end = self.clock.end_date()?;
        if let Some(outside) = orders.iter().find(|o| o.date < start || o.date > end) {
            return Err(PaperTraderError::InvalidOrder {
                reason: format!(
                    "restored order dated {} is outside the run {start} to {end}",
                    outside.date
                ),
            });
        }

        let ledger = TradeLedger::from_persisted(orders)?;
        let newest = ledger.all_orders().iter().map(|o| o.date).max();
        self.ledger = ledger;
        tracing::info!(
            user = %self.user_id,
            orders = self.ledger.len(),
            "ledger restored"
        );

        match newest {
            Some(date) if date > self.clock.current_date()? => {
                self.advance_to(date, prices)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Switch instruments. The cache is replaced before anything reads it,
    /// so one instrument's prices are never applied to another's position.
    pub fn select_ticker(
        &mut self,
        ticker: &str,
        prices: &dyn PricePort,
    ) -> Result<(), PaperTraderError> {
        self.ticker = normalize_ticker(ticker)?;
        self.refresh_prices(prices)
    }

    /// Reload `[start_date, current_date]` for the selected ticker.
    pub fn refresh_prices(&mut self, prices: &dyn PricePort) -> Result<(), PaperTraderError> {
        let current = self.clock.current_date()?;
        self.cache
            .refresh(prices, &self.ticker, self.config.start_date, current);
        Ok(())
    }

    pub fn advance(
        &mut self,
        days: i64,
        prices: &dyn PricePort,
    ) -> Result<NaiveDate, PaperTraderError> {
        let date = self.clock.advance(days, self.policies.advance)?;
        self.refresh_prices(prices)?;
        Ok(date)
    }

    pub fn advance_to(
        &mut self,
        target: NaiveDate,
        prices: &dyn PricePort,
    ) -> Result<NaiveDate, PaperTraderError> {
        let date = self.clock.advance_to(target, self.policies.advance)?;
        self.refresh_prices(prices)?;
        Ok(date)
    }

    /// Place an order for the selected ticker at the current date.
    ///
    /// On success the order is in the ledger before either collaborator is
    /// called. A failed save or analysis request is logged and does not
    /// undo the trade.
    pub fn place_order(
        &mut self,
        side: Side,
        quantity: i64,
        store: &dyn TradeStorePort,
        analyst: &dyn AnalysisPort,
    ) -> Result<Order, PaperTraderError> {
        let proposed = ProposedOrder {
            date: self.clock.current_date()?,
            ticker: self.ticker.clone(),
            quantity,
            side,
        };

        let order = match validator::validate(
            proposed,
            &self.ledger,
            &self.cache,
            &self.config,
            self.policies.capital_check,
        ) {
            Ok(order) => order,
            Err(rejection) => {
                tracing::warn!(
                    user = %self.user_id,
                    ticker = %self.ticker,
                    %side,
                    quantity,
                    reason = %rejection,
                    "order rejected"
                );
                return Err(rejection.into());
            }
        };

        self.ledger.append(order.clone())?;
        tracing::info!(
            user = %self.user_id,
            ticker = %order.ticker,
            date = %order.date,
            side = %order.side,
            quantity = order.quantity,
            price = %order.price,
            "trade placed"
        );

        if let Err(e) = store.save_order(&self.user_id, &self.config, &order) {
            tracing::warn!(user = %self.user_id, error = %e, "failed to persist order");
        }

        if self.analysis.should_analyse(&order) {
            if let Err(e) = analyst.request_analysis(&analysis_prompt(&order)) {
                tracing::warn!(user = %self.user_id, error = %e, "analysis request failed");
            }
        }

        Ok(order)
    }

    /// Holdings and cash for the selected ticker as of the current date.
    pub fn position(&self) -> Result<PositionSnapshot, ClockError> {
        Ok(reconstruct(
            &self.ledger,
            &self.ticker,
            self.clock.current_date()?,
            self.config.starting_capital,
        ))
    }

    pub fn history(&self) -> Result<Vec<HistoryPoint>, ClockError> {
        Ok(history::build(
            &self.ledger,
            &self.cache,
            &self.config,
            self.clock.current_date()?,
        ))
    }

    pub fn summary(&self) -> Result<SimulationSummary, ClockError> {
        Ok(SimulationSummary::from_history(
            &self.config,
            self.history()?,
        ))
    }

    pub fn metrics(&self, risk_free_rate: f64) -> Result<Metrics, ClockError> {
        Ok(Metrics::compute(
            &self.history()?,
            self.config.starting_capital,
            &self.ledger,
            risk_free_rate,
        ))
    }

    pub fn current_date(&self) -> Result<NaiveDate, ClockError> {
        self.clock.current_date()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn policies(&self) -> &SimulationPolicies {
        &self.policies
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn cache(&self) -> &PriceSeriesCache {
        &self.cache
    }
}

fn normalize_ticker(ticker: &str) -> Result<String, PaperTraderError> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(PaperTraderError::ConfigurationInvalid {
            reason: "ticker must not be empty".into(),
        });
    }
    Ok(ticker)
}
