//! Performance metrics over a portfolio history, and the leaderboard.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;

use super::history::{HistoryPoint, SimulationSummary};
use super::ledger::TradeLedger;
use super::order::Side;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub buys: usize,
    pub sells: usize,
    pub traded_value: Decimal,
}

impl Metrics {
    pub fn compute(
        history: &[HistoryPoint],
        starting_capital: Decimal,
        ledger: &TradeLedger,
        risk_free_rate: f64,
    ) -> Self {
        let values: Vec<f64> = history
            .iter()
            .map(|p| p.value.to_f64().unwrap_or(0.0))
            .collect();
        let initial = starting_capital.to_f64().unwrap_or(0.0);
        let final_value = values.last().copied().unwrap_or(initial);

        let total_return = if initial > 0.0 {
            (final_value - initial) / initial
        } else {
            0.0
        };

        let years = values.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&values);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (volatility, sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&values, daily_rf);

        let orders = ledger.all_orders();
        let buys = orders.iter().filter(|o| o.side == Side::Buy).count();
        let traded_value = orders.iter().map(|o| o.value()).sum();

        Metrics {
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            buys,
            sells: orders.len() - buys,
            traded_value,
        }
    }
}

fn compute_drawdown(values: &[f64]) -> (f64, i64) {
    let Some(&first) = values.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for &value in values {
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

/// (annualised volatility, sharpe, sortino)
fn compute_risk_adjusted(values: &[f64], daily_rf: f64) -> (f64, f64, f64) {
    if values.len() < 2 {
        return (0.0, 0.0, 0.0);
    }

    let returns: Vec<f64> = values
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let annual = TRADING_DAYS_PER_YEAR.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        excess_return / stddev * annual
    } else {
        0.0
    };

    let downside_variance = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside_variance.sqrt();

    let sortino = if downside_stddev > 0.0 {
        excess_return / downside_stddev * annual
    } else {
        0.0
    };

    (stddev * annual, sharpe, sortino)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub percent_gain: Decimal,
}

/// Rank each user's best saved simulation by percent gain, highest first.
/// Ties keep user id order.
pub fn leaderboard(simulations: &[(String, SimulationSummary)]) -> Vec<LeaderboardEntry> {
    let mut best: BTreeMap<&str, Decimal> = BTreeMap::new();
    for (user_id, summary) in simulations {
        let gain = summary.percent_gain();
        best.entry(user_id.as_str())
            .and_modify(|g| *g = (*g).max(gain))
            .or_insert(gain);
    }

    let mut ranked: Vec<(&str, Decimal)> = best.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, percent_gain))| LeaderboardEntry {
            rank: i + 1,
            user_id: user_id.to_string(),
            percent_gain: percent_gain.round_dp(2),
        })
        .collect()
}
