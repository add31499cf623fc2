//! Property tests over random order sequences.
//!
//! Tests cover:
//! - Admitted sequences never reconstruct to negative shares or cash on any
//!   cached date, including across resumed sessions and back-dated trades
//! - Cash conservation against a direct ledger sum at every step
//! - Resumed sessions rebuild the same ledger and position
//! - Derived views are deterministic

mod common;

use chrono::Duration;
use common::*;
use papertrader::adapters::file_config_adapter::FileConfigAdapter;
use papertrader::cli;
use papertrader::domain::order::Side;
use papertrader::domain::position::reconstruct;
use papertrader::domain::session::Simulation;
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Step {
    Trade { buy: bool, quantity: i64, days: i64 },
    Resume,
    BackDated { buy: bool, quantity: i64, days_back: i64 },
}

fn side(buy: bool) -> Side {
    if buy { Side::Buy } else { Side::Sell }
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (any::<bool>(), 1i64..40, 0i64..4)
            .prop_map(|(buy, quantity, days)| Step::Trade { buy, quantity, days }),
        1 => Just(Step::Resume),
        1 => (any::<bool>(), 1i64..40, 1i64..10)
            .prop_map(|(buy, quantity, days_back)| Step::BackDated { buy, quantity, days_back }),
    ]
}

fn config(capital_check: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(&format!(
        "[simulation]\n\
         user_id = prop\n\
         ticker = TICK\n\
         start_date = 2024-01-01\n\
         duration_months = 2\n\
         starting_capital = 5000\n\
         \n\
         [policy]\n\
         capital_check = {capital_check}\n\
         \n\
         [prices]\n\
         source = csv\n\
         csv_dir = /tmp/papertrader-prices\n"
    ))
    .unwrap()
}

fn prices_from_cents(cents: &[i64]) -> MockPricePort {
    let start = date(2024, 1, 1);
    let points = cents
        .iter()
        .enumerate()
        .map(|(i, &c)| make_point(start + Duration::days(i as i64), Decimal::new(c, 2)))
        .collect();
    MockPricePort::new().with_points("TICK", points)
}

fn check_invariants(sim: &Simulation) -> Result<(), TestCaseError> {
    let capital = Decimal::from(5000);
    for point in sim.cache().points() {
        let snap = reconstruct(sim.ledger(), "TICK", point.date, capital);
        prop_assert!(snap.shares >= 0, "negative shares on {}", point.date);
        prop_assert!(snap.leftover_cash >= Decimal::ZERO, "overspent on {}", point.date);
    }

    let position = sim.position().unwrap();
    let mut cash = capital;
    let mut shares = 0i64;
    for order in sim.ledger().all_orders() {
        cash -= order.signed_value();
        shares += order.signed_quantity();
    }
    prop_assert_eq!(position.leftover_cash, cash);
    prop_assert_eq!(position.shares, shares);

    let current = sim.current_date().unwrap();
    if let Some(price) = sim.cache().price_as_of(current) {
        let value = sim.history().unwrap().last().unwrap().value;
        prop_assert_eq!(value, cash + Decimal::from(shares) * price);
    }
    Ok(())
}

fn run_sequence(cents: &[i64], steps: &[Step], capital_check: &str) -> Result<(), TestCaseError> {
    let prices = prices_from_cents(cents);
    let store = MemoryTradeStore::new();
    let analyst = RecordingAnalyst::new();
    let config = config(capital_check);
    let today = date(2030, 1, 1);
    let mut sim = cli::start_session(&config, None, today, &prices, &store).unwrap();

    for step in steps {
        match *step {
            Step::Trade {
                buy,
                quantity,
                days,
            } => {
                if days > 0 {
                    sim.advance(days, &prices).unwrap();
                }
                let _ = sim.place_order(side(buy), quantity, &store, &analyst);
            }
            Step::Resume => {
                let resumed = cli::start_session(&config, None, today, &prices, &store).unwrap();
                prop_assert_eq!(resumed.ledger().all_orders(), sim.ledger().all_orders());
                prop_assert!(resumed.current_date().unwrap() <= sim.current_date().unwrap());
                sim = resumed;
            }
            Step::BackDated {
                buy,
                quantity,
                days_back,
            } => {
                let current = sim.current_date().unwrap();
                let on = (current - Duration::days(days_back)).max(sim.config().start_date);
                let _ = cli::run_trade_pipeline(
                    &mut sim,
                    side(buy),
                    quantity,
                    on,
                    &prices,
                    &store,
                    &analyst,
                );
                prop_assert_eq!(sim.current_date().unwrap(), current);
            }
        }
        check_invariants(&sim)?;
    }

    prop_assert_eq!(sim.history().unwrap(), sim.history().unwrap());
    let current = sim.current_date().unwrap();
    prop_assert_eq!(
        reconstruct(sim.ledger(), "TICK", current, Decimal::from(5000)),
        sim.position().unwrap()
    );
    Ok(())
}

proptest! {
    #[test]
    fn admitted_orders_keep_shares_and_cash_non_negative(
        cents in prop::collection::vec(500i64..50_000, 70),
        steps in prop::collection::vec(step(), 1..40),
    ) {
        run_sequence(&cents, &steps, "as_of_date")?;
    }

    #[test]
    fn all_time_capital_check_keeps_the_same_guarantees(
        cents in prop::collection::vec(500i64..50_000, 70),
        steps in prop::collection::vec(step(), 1..40),
    ) {
        run_sequence(&cents, &steps, "all_time")?;
    }
}
