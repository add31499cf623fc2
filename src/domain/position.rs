//! Position and cash reconstruction from the ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::ledger::TradeLedger;
use super::order::Side;

/// Holdings and cash for one instrument as of a cutoff date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSnapshot {
    pub shares: i64,
    /// Cumulative buys minus cumulative sells, in currency units.
    pub net_spent: Decimal,
    pub leftover_cash: Decimal,
}

impl PositionSnapshot {
    pub fn flat(starting_capital: Decimal) -> Self {
        PositionSnapshot {
            shares: 0,
            net_spent: Decimal::ZERO,
            leftover_cash: starting_capital,
        }
    }

    /// False when the ledger holds more sells than buys, which only happens
    /// if orders bypassed validation. Shorting is not supported.
    pub fn is_consistent(&self) -> bool {
        self.shares >= 0
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.shares) * price
    }

    /// leftover_cash + shares * price
    pub fn total_value(&self, price: Decimal) -> Decimal {
        self.leftover_cash + self.market_value(price)
    }
}

/// Fold every `ticker` order dated on or before `cutoff` into a snapshot.
///
/// Buys add shares and spend cash, sells do the reverse, in date order with
/// admission order breaking ties. Pure: no state outside the arguments.
pub fn reconstruct(
    ledger: &TradeLedger,
    ticker: &str,
    cutoff: NaiveDate,
    starting_capital: Decimal,
) -> PositionSnapshot {
    let mut shares = 0i64;
    let mut net_spent = Decimal::ZERO;

    for order in ledger.orders_for(ticker, cutoff) {
        let cost = order.value();
        match order.side {
            Side::Buy => {
                shares += order.quantity;
                net_spent += cost;
            }
            Side::Sell => {
                shares -= order.quantity;
                net_spent -= cost;
            }
        }
    }

    let snapshot = PositionSnapshot {
        shares,
        net_spent,
        leftover_cash: starting_capital - net_spent,
    };
    if !snapshot.is_consistent() {
        tracing::error!(
            ticker,
            %cutoff,
            shares,
            "negative share count reconstructed; ledger contains unvalidated sells"
        );
    }
    snapshot
}

/// Net spend on `ticker` across the whole ledger, regardless of date.
pub fn net_spent_all_time(ledger: &TradeLedger, ticker: &str) -> Decimal {
    ledger
        .all_orders()
        .iter()
        .filter(|o| o.ticker == ticker)
        .map(|o| o.signed_value())
        .sum()
}
