//! Port traits for the external collaborators.

pub mod analysis_port;
pub mod config_port;
pub mod price_port;
pub mod trade_store_port;
