//! Trade validation gate.
//!
//! Checks a proposed order against the position reconstructed as of the
//! order's date and returns the priced order on success. Nothing is
//! appended here; the caller owns the ledger mutation.

use rust_decimal::Decimal;

use super::config::{CapitalCheck, SimulationConfig};
use super::error::TradeRejection;
use super::ledger::TradeLedger;
use super::order::{Order, ProposedOrder, Side};
use super::position::{net_spent_all_time, reconstruct};
use super::price_cache::PriceSeriesCache;

pub fn validate(
    proposed: ProposedOrder,
    ledger: &TradeLedger,
    cache: &PriceSeriesCache,
    config: &SimulationConfig,
    capital_check: CapitalCheck,
) -> Result<Order, TradeRejection> {
    if proposed.quantity <= 0 {
        return Err(TradeRejection::InvalidQuantity {
            quantity: proposed.quantity,
        });
    }

    let price = cache
        .price_as_of_for(&proposed.ticker, proposed.date)
        .ok_or_else(|| TradeRejection::NoPriceData {
            ticker: proposed.ticker.clone(),
            date: proposed.date,
        })?;

    let cost = price * Decimal::from(proposed.quantity);

    match proposed.side {
        Side::Buy => {
            let net_spent = match capital_check {
                CapitalCheck::AsOfDate => {
                    reconstruct(
                        ledger,
                        &proposed.ticker,
                        proposed.date,
                        config.starting_capital,
                    )
                    .net_spent
                }
                CapitalCheck::AllTime => net_spent_all_time(ledger, &proposed.ticker),
            };
            if net_spent + cost > config.starting_capital {
                return Err(TradeRejection::InsufficientCapital {
                    required: cost,
                    available: config.starting_capital - net_spent,
                });
            }
        }
        Side::Sell => {
            let held = reconstruct(
                ledger,
                &proposed.ticker,
                proposed.date,
                config.starting_capital,
            )
            .shares;
            if proposed.quantity > held {
                return Err(TradeRejection::InsufficientShares {
                    requested: proposed.quantity,
                    held,
                });
            }
        }
    }

    Ok(proposed.priced(price))
}
