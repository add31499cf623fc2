//! Trade persistence provider port.

use crate::domain::config::SimulationConfig;
use crate::domain::error::PaperTraderError;
use crate::domain::history::SimulationSummary;
use crate::domain::order::Order;

/// Durable store for placed orders and finished simulations, namespaced by
/// an opaque user id.
///
/// Orders are also keyed by the run configuration they were placed under
/// (start date, duration and starting capital), so a changed configuration
/// starts from an empty ledger.
pub trait TradeStorePort {
    fn save_order(
        &self,
        user_id: &str,
        run: &SimulationConfig,
        order: &Order,
    ) -> Result<(), PaperTraderError>;

    /// Orders saved for `user_id` under `run`, newest first.
    fn load_orders(
        &self,
        user_id: &str,
        run: &SimulationConfig,
    ) -> Result<Vec<Order>, PaperTraderError>;

    fn save_simulation(
        &self,
        user_id: &str,
        summary: &SimulationSummary,
    ) -> Result<(), PaperTraderError>;

    /// Every saved simulation paired with its owner.
    fn list_simulations(&self) -> Result<Vec<(String, SimulationSummary)>, PaperTraderError>;
}
