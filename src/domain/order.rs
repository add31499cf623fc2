//! Orders placed against the simulated portfolio.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side '{other}', expected buy or sell")),
        }
    }
}

/// An order admitted to the ledger. The price is the instrument's close as
/// of `date`, fixed at admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub date: NaiveDate,
    pub ticker: String,
    pub quantity: i64,
    pub price: Decimal,
    pub side: Side,
}

impl Order {
    /// price * quantity
    pub fn value(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Trade value signed by direction: positive for buys (cash out),
    /// negative for sells (cash in).
    pub fn signed_value(&self) -> Decimal {
        match self.side {
            Side::Buy => self.value(),
            Side::Sell => -self.value(),
        }
    }

    /// Share change signed by direction.
    pub fn signed_quantity(&self) -> i64 {
        match self.side {
            Side::Buy => self.quantity,
            Side::Sell => -self.quantity,
        }
    }
}

/// An order as requested by the user, before a price is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedOrder {
    pub date: NaiveDate,
    pub ticker: String,
    pub quantity: i64,
    pub side: Side,
}

impl ProposedOrder {
    pub fn priced(self, price: Decimal) -> Order {
        Order {
            date: self.date,
            ticker: self.ticker,
            quantity: self.quantity,
            price,
            side: self.side,
        }
    }
}
