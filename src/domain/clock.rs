//! Simulation clock.

use chrono::{Duration, NaiveDate};

use super::config::{AdvancePolicy, DAYS_PER_MONTH, EndDatePolicy, SimulationConfig};
use super::error::{ClockError, PaperTraderError};

pub const DAY: i64 = 1;
pub const WEEK: i64 = 7;
pub const MONTH: i64 = DAYS_PER_MONTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    #[default]
    NotStarted,
    Running {
        start: NaiveDate,
        current: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationClock {
    state: ClockState,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `config.start_date`. `today` is only consulted by the end
    /// date policy.
    pub fn start(
        &mut self,
        config: &SimulationConfig,
        today: NaiveDate,
        policy: EndDatePolicy,
    ) -> Result<(), PaperTraderError> {
        config.validate()?;
        let start = config.start_date;
        let mut end = config.end_date();

        if end > today {
            match policy {
                EndDatePolicy::Allow => {}
                EndDatePolicy::RejectFuture => {
                    return Err(PaperTraderError::ConfigurationInvalid {
                        reason: format!("simulation would end on {end}, after today ({today})"),
                    });
                }
                EndDatePolicy::ClampToToday => {
                    if start > today {
                        return Err(PaperTraderError::ConfigurationInvalid {
                            reason: format!("start date {start} is in the future"),
                        });
                    }
                    end = today;
                }
            }
        }

        self.state = ClockState::Running {
            start,
            current: start,
            end,
        };
        tracing::info!(%start, %end, "simulation clock started");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = ClockState::NotStarted;
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running { .. })
    }

    pub fn current_date(&self) -> Result<NaiveDate, ClockError> {
        match self.state {
            ClockState::Running { current, .. } => Ok(current),
            ClockState::NotStarted => Err(ClockError::NotStarted),
        }
    }

    pub fn start_date(&self) -> Result<NaiveDate, ClockError> {
        match self.state {
            ClockState::Running { start, .. } => Ok(start),
            ClockState::NotStarted => Err(ClockError::NotStarted),
        }
    }

    pub fn end_date(&self) -> Result<NaiveDate, ClockError> {
        match self.state {
            ClockState::Running { end, .. } => Ok(end),
            ClockState::NotStarted => Err(ClockError::NotStarted),
        }
    }

    /// Move forward `days`. Under [`AdvancePolicy::Clamp`] a step past the
    /// end lands on the end date; under [`AdvancePolicy::Reject`] it fails
    /// and the clock does not move. A step beyond the calendar's range is
    /// treated as past the end.
    pub fn advance(&mut self, days: i64, policy: AdvancePolicy) -> Result<NaiveDate, ClockError> {
        let current = self.current_date()?;
        let target = Duration::try_days(days)
            .and_then(|step| current.checked_add_signed(step))
            .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX });
        self.advance_to(target, policy)
    }

    pub fn advance_to(
        &mut self,
        target: NaiveDate,
        policy: AdvancePolicy,
    ) -> Result<NaiveDate, ClockError> {
        let ClockState::Running { start, current, end } = self.state else {
            return Err(ClockError::NotStarted);
        };

        if target < current {
            return Err(ClockError::BeforeCurrent {
                requested: target,
                current,
            });
        }

        let next = if target > end {
            match policy {
                AdvancePolicy::Clamp => end,
                AdvancePolicy::Reject => {
                    return Err(ClockError::BeyondEnd {
                        requested: target,
                        end,
                    });
                }
            }
        } else {
            target
        };

        self.state = ClockState::Running {
            start,
            current: next,
            end,
        };
        tracing::info!(from = %current, to = %next, "simulation clock advanced");
        Ok(next)
    }
}
