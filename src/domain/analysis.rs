//! Trade analysis prompts and request de-duplication.

use chrono::NaiveDate;
use std::collections::HashSet;

use super::config::AnalysisDedup;
use super::order::Order;

/// Deterministic prompt describing a just-admitted order.
pub fn analysis_prompt(order: &Order) -> String {
    format!(
        "Analyze the following trade: {side} {quantity} shares of {ticker} at ${price:.2} on {date}. \
         Trade value: ${value:.2}. \
         Comment on the timing of this trade, the risk it adds to the portfolio, \
         and what an investor should watch for next.",
        side = order.side,
        quantity = order.quantity,
        ticker = order.ticker,
        price = order.price,
        date = order.date,
        value = order.value(),
    )
}

/// Decides which admitted orders trigger an analysis request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisTracker {
    dedup: AnalysisDedup,
    analysed_dates: HashSet<NaiveDate>,
}

impl AnalysisTracker {
    pub fn new(dedup: AnalysisDedup) -> Self {
        AnalysisTracker {
            dedup,
            analysed_dates: HashSet::new(),
        }
    }

    /// Call once per admitted order.
    pub fn should_analyse(&mut self, order: &Order) -> bool {
        match self.dedup {
            AnalysisDedup::PerOrder => true,
            AnalysisDedup::PerDate => self.analysed_dates.insert(order.date),
        }
    }

    pub fn reset(&mut self) {
        self.analysed_dates.clear();
    }
}
