//! Simulation configuration and behaviour policies.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use super::error::PaperTraderError;

/// Days per configured month. The simulation window is month-count * 30 days,
/// not calendar months.
pub const DAYS_PER_MONTH: i64 = 30;
pub const MIN_DURATION_MONTHS: u32 = 1;
pub const MAX_DURATION_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub start_date: NaiveDate,
    pub duration_months: u32,
    pub starting_capital: Decimal,
}

impl SimulationConfig {
    pub fn new(
        start_date: NaiveDate,
        duration_months: u32,
        starting_capital: Decimal,
    ) -> Result<Self, PaperTraderError> {
        let config = SimulationConfig {
            start_date,
            duration_months,
            starting_capital,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PaperTraderError> {
        if !(MIN_DURATION_MONTHS..=MAX_DURATION_MONTHS).contains(&self.duration_months) {
            return Err(PaperTraderError::ConfigurationInvalid {
                reason: format!(
                    "duration_months must be between {MIN_DURATION_MONTHS} and {MAX_DURATION_MONTHS}, got {}",
                    self.duration_months
                ),
            });
        }
        if self.starting_capital <= Decimal::ZERO {
            return Err(PaperTraderError::ConfigurationInvalid {
                reason: format!(
                    "starting_capital must be positive, got {}",
                    self.starting_capital
                ),
            });
        }
        Ok(())
    }

    /// start_date + duration_months * 30 days
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Duration::days(i64::from(self.duration_months) * DAYS_PER_MONTH)
    }
}

/// How buy orders are checked against capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapitalCheck {
    /// Net spend from orders dated on or before the new order's date.
    #[default]
    AsOfDate,
    /// Net spend from every order on the ticker, whatever its date.
    AllTime,
}

/// What happens when a clock step would pass the end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvancePolicy {
    #[default]
    Clamp,
    Reject,
}

/// Treatment of a simulation window that ends after today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndDatePolicy {
    #[default]
    Allow,
    RejectFuture,
    ClampToToday,
}

/// Which admitted orders get an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisDedup {
    /// Every admitted order is analysed once.
    #[default]
    PerOrder,
    /// Only the first admitted order of each date is analysed.
    PerDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationPolicies {
    pub capital_check: CapitalCheck,
    pub advance: AdvancePolicy,
    pub end_date: EndDatePolicy,
    pub analysis_dedup: AnalysisDedup,
}
