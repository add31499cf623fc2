//! Domain error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Why a proposed order was refused. No state changes when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradeRejection {
    #[error("no price data for {ticker} on or before {date}")]
    NoPriceData { ticker: String, date: NaiveDate },

    #[error("insufficient capital: order needs {required}, only {available} available")]
    InsufficientCapital {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient shares: tried to sell {requested}, holding {held}")]
    InsufficientShares { requested: i64, held: i64 },

    #[error("quantity must be positive, got {quantity}")]
    InvalidQuantity { quantity: i64 },
}

/// Simulation clock failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("simulation has not been started")]
    NotStarted,

    #[error("cannot move past the simulation end date {end} (requested {requested})")]
    BeyondEnd { requested: NaiveDate, end: NaiveDate },

    #[error("cannot move back to {requested}, current date is {current}")]
    BeforeCurrent {
        requested: NaiveDate,
        current: NaiveDate,
    },
}

/// Top-level error type for papertrader.
#[derive(Debug, thiserror::Error)]
pub enum PaperTraderError {
    #[error("trade rejected: {0}")]
    Rejected(#[from] TradeRejection),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("upstream fetch failed for {ticker}: {reason}")]
    UpstreamFetch { ticker: String, reason: String },

    #[error("malformed price row {row}: {reason}")]
    MalformedPriceRow { row: usize, reason: String },

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error("analysis request failed: {reason}")]
    Analysis { reason: String },

    #[error("invalid simulation configuration: {reason}")]
    ConfigurationInvalid { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PaperTraderError> for std::process::ExitCode {
    fn from(err: &PaperTraderError) -> Self {
        let code: u8 = match err {
            PaperTraderError::Io(_) => 1,
            PaperTraderError::ConfigurationInvalid { .. }
            | PaperTraderError::ConfigParse { .. }
            | PaperTraderError::ConfigMissing { .. }
            | PaperTraderError::ConfigInvalid { .. } => 2,
            PaperTraderError::Database { .. } | PaperTraderError::DatabaseQuery { .. } => 3,
            PaperTraderError::Rejected(_)
            | PaperTraderError::Clock(_)
            | PaperTraderError::InvalidOrder { .. } => 4,
            PaperTraderError::UpstreamFetch { .. }
            | PaperTraderError::MalformedPriceRow { .. }
            | PaperTraderError::NoData { .. }
            | PaperTraderError::Analysis { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
