//! Configuration validation.
//!
//! Validates the INI sections before a simulation starts and builds the
//! typed configuration from them.

use crate::domain::config::{
    AdvancePolicy, AnalysisDedup, CapitalCheck, EndDatePolicy, MAX_DURATION_MONTHS,
    MIN_DURATION_MONTHS, SimulationConfig, SimulationPolicies,
};
use crate::domain::error::PaperTraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const GUEST_USER: &str = "guest";

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), PaperTraderError> {
    build_simulation_config(config)?;
    validate_ticker(config)?;
    build_policies(config)?;
    validate_price_source(config)?;
    build_risk_free_rate(config)?;
    Ok(())
}

pub fn build_simulation_config(
    config: &dyn ConfigPort,
) -> Result<SimulationConfig, PaperTraderError> {
    let start_date = parse_date(config.get_string("simulation", "start_date").as_deref())?;
    let duration_months = parse_duration(config)?;
    let starting_capital = parse_capital(config)?;

    Ok(SimulationConfig {
        start_date,
        duration_months,
        starting_capital,
    })
}

pub fn build_policies(config: &dyn ConfigPort) -> Result<SimulationPolicies, PaperTraderError> {
    let capital_check = match config.get_choice("policy", "capital_check", "as_of_date").as_str() {
        "as_of_date" => CapitalCheck::AsOfDate,
        "all_time" => CapitalCheck::AllTime,
        _ => return Err(invalid_choice("capital_check", "as_of_date, all_time")),
    };
    let advance = match config.get_choice("policy", "advance", "clamp").as_str() {
        "clamp" => AdvancePolicy::Clamp,
        "reject" => AdvancePolicy::Reject,
        _ => return Err(invalid_choice("advance", "clamp, reject")),
    };
    let end_date = match config.get_choice("policy", "end_date", "allow").as_str() {
        "allow" => EndDatePolicy::Allow,
        "reject_future" => EndDatePolicy::RejectFuture,
        "clamp_to_today" => EndDatePolicy::ClampToToday,
        _ => {
            return Err(invalid_choice(
                "end_date",
                "allow, reject_future, clamp_to_today",
            ));
        }
    };
    let analysis_dedup = match config.get_choice("policy", "analysis_dedup", "per_order").as_str()
    {
        "per_order" => AnalysisDedup::PerOrder,
        "per_date" => AnalysisDedup::PerDate,
        _ => return Err(invalid_choice("analysis_dedup", "per_order, per_date")),
    };

    Ok(SimulationPolicies {
        capital_check,
        advance,
        end_date,
        analysis_dedup,
    })
}

/// Annual risk-free rate from `[metrics] risk_free_rate`, in `[0, 1)`.
/// Absent means zero.
pub fn build_risk_free_rate(config: &dyn ConfigPort) -> Result<f64, PaperTraderError> {
    let invalid = |reason: &str| PaperTraderError::ConfigInvalid {
        section: "metrics".into(),
        key: "risk_free_rate".into(),
        reason: reason.into(),
    };
    if let Some(raw) = config.get_string("metrics", "risk_free_rate") {
        if !raw.trim().is_empty() && raw.trim().parse::<f64>().is_err() {
            return Err(invalid("risk_free_rate must be a number"));
        }
    }
    let value = config.get_double("metrics", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("risk_free_rate must be between 0 and 1"));
    }
    Ok(value)
}

/// `--ticker` wins over `[simulation] ticker`. Always upper-cased.
pub fn resolve_ticker(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, PaperTraderError> {
    let ticker = match ticker_override {
        Some(t) => t.to_string(),
        None => config.get_string("simulation", "ticker").unwrap_or_default(),
    };
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(PaperTraderError::ConfigMissing {
            section: "simulation".into(),
            key: "ticker".into(),
        });
    }
    Ok(ticker)
}

pub fn resolve_user_id(config: &dyn ConfigPort) -> String {
    config
        .get_string("simulation", "user_id")
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| GUEST_USER.to_string())
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), PaperTraderError> {
    resolve_ticker(None, config).map(|_| ())
}

fn validate_price_source(config: &dyn ConfigPort) -> Result<(), PaperTraderError> {
    match config.get_choice("prices", "source", "csv").as_str() {
        "csv" => match config.get_string("prices", "csv_dir") {
            Some(dir) if !dir.trim().is_empty() => Ok(()),
            _ => Err(PaperTraderError::ConfigMissing {
                section: "prices".into(),
                key: "csv_dir".into(),
            }),
        },
        "sqlite" => match config.get_string("sqlite", "path") {
            Some(path) if !path.trim().is_empty() => Ok(()),
            _ => Err(PaperTraderError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            }),
        },
        _ => Err(PaperTraderError::ConfigInvalid {
            section: "prices".into(),
            key: "source".into(),
            reason: "expected one of: csv, sqlite".into(),
        }),
    }
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate, PaperTraderError> {
    match value {
        None => Err(PaperTraderError::ConfigMissing {
            section: "simulation".into(),
            key: "start_date".into(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            PaperTraderError::ConfigInvalid {
                section: "simulation".into(),
                key: "start_date".into(),
                reason: "invalid start_date format, expected YYYY-MM-DD".into(),
            }
        }),
    }
}

fn parse_duration(config: &dyn ConfigPort) -> Result<u32, PaperTraderError> {
    let value = config.get_int("simulation", "duration_months", 1);
    u32::try_from(value)
        .ok()
        .filter(|m| (MIN_DURATION_MONTHS..=MAX_DURATION_MONTHS).contains(m))
        .ok_or_else(|| PaperTraderError::ConfigInvalid {
            section: "simulation".into(),
            key: "duration_months".into(),
            reason: format!(
                "duration_months must be between {MIN_DURATION_MONTHS} and {MAX_DURATION_MONTHS}"
            ),
        })
}

fn parse_capital(config: &dyn ConfigPort) -> Result<Decimal, PaperTraderError> {
    let raw = config
        .get_string("simulation", "starting_capital")
        .ok_or_else(|| PaperTraderError::ConfigMissing {
            section: "simulation".into(),
            key: "starting_capital".into(),
        })?;
    let value = Decimal::from_str(raw.trim()).map_err(|e| PaperTraderError::ConfigInvalid {
        section: "simulation".into(),
        key: "starting_capital".into(),
        reason: e.to_string(),
    })?;
    if value <= Decimal::ZERO {
        return Err(PaperTraderError::ConfigInvalid {
            section: "simulation".into(),
            key: "starting_capital".into(),
            reason: "starting_capital must be positive".into(),
        });
    }
    Ok(value)
}

fn invalid_choice(key: &str, allowed: &str) -> PaperTraderError {
    PaperTraderError::ConfigInvalid {
        section: "policy".into(),
        key: key.into(),
        reason: format!("expected one of: {allowed}"),
    }
}
