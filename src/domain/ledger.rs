//! Append-only trade ledger.
//!
//! Orders are kept in admission order. Readers that need chronological
//! order get it from [`TradeLedger::orders_for`], which sorts stably by date
//! so same-day orders keep their admission order.

use chrono::NaiveDate;

use super::error::PaperTraderError;
use super::order::Order;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeLedger {
    orders: Vec<Order>,
}

impl TradeLedger {
    pub fn new() -> Self {
        TradeLedger { orders: Vec::new() }
    }

    /// Seed a ledger from a newest-first store listing. The listing is
    /// reversed back into admission order and then sorted stably by date, so
    /// same-day orders keep the order they were placed in.
    pub fn from_persisted(mut orders: Vec<Order>) -> Result<Self, PaperTraderError> {
        orders.reverse();
        orders.sort_by_key(|o| o.date);
        let mut ledger = TradeLedger::new();
        for order in orders {
            ledger.append(order)?;
        }
        Ok(ledger)
    }

    /// Append an already-validated order. Only structural checks happen
    /// here; affordability is the validator's job.
    pub fn append(&mut self, order: Order) -> Result<(), PaperTraderError> {
        if order.quantity <= 0 {
            return Err(PaperTraderError::InvalidOrder {
                reason: format!("quantity must be positive, got {}", order.quantity),
            });
        }
        if order.ticker.trim().is_empty() {
            return Err(PaperTraderError::InvalidOrder {
                reason: "ticker must not be empty".into(),
            });
        }
        self.orders.push(order);
        Ok(())
    }

    pub fn all_orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders for `ticker` dated on or before `on_or_before`, ascending by
    /// date with admission order as the tie-break.
    pub fn orders_for(&self, ticker: &str, on_or_before: NaiveDate) -> Vec<&Order> {
        let mut selected: Vec<&Order> = self
            .orders
            .iter()
            .filter(|o| o.ticker == ticker && o.date <= on_or_before)
            .collect();
        selected.sort_by_key(|o| o.date);
        selected
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
