//! Core domain types and logic.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod history;
pub mod ledger;
pub mod metrics;
pub mod order;
pub mod position;
pub mod price;
pub mod price_cache;
pub mod session;
pub mod validator;
